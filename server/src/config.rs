//! Server configuration, immutable once the server is bound

use shared::{MazeDimensions, MazeError, DEFAULT_PORT};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub dimensions: MazeDimensions,
    /// Fixed base seed; round `n` (1-based) uses `seed + n - 1`. Wall-clock seeds when unset.
    pub seed: Option<u64>,
}

impl ServerConfig {
    /// Builds a configuration, rejecting degenerate maze sizes up front
    pub fn new(
        host: impl Into<String>,
        port: u16,
        width: usize,
        height: usize,
        seed: Option<u64>,
    ) -> Result<Self, MazeError> {
        Ok(Self {
            host: host.into(),
            port,
            dimensions: MazeDimensions::new(width, height)?,
            seed,
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            dimensions: MazeDimensions::default(),
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.dimensions.width(), 41);
        assert_eq!(config.dimensions.height(), 31);
        assert_eq!(config.seed, None);
        assert_eq!(config.address(), "0.0.0.0:5000");
    }

    #[test]
    fn test_config_rejects_small_maze() {
        assert!(ServerConfig::new("127.0.0.1", 0, 4, 31, None).is_err());
        assert!(ServerConfig::new("127.0.0.1", 0, 41, 2, None).is_err());

        let config = ServerConfig::new("127.0.0.1", 0, 5, 5, Some(9)).unwrap();
        assert_eq!(config.address(), "127.0.0.1:0");
        assert_eq!(config.seed, Some(9));
    }
}
