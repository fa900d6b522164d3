//! Engine configuration: grid geometry, cooldown, checkpoints and per-level tables.
//!
//! Files use the btop-style `key="value"` layout, one setting per line:
//!
//! ```text
//! grid_size=9
//! cooldown_ms=100
//! checkpoints="100 300 600"
//! unbreakable="#5C6370"
//! level[1].palette="#E06C75 #98C379 #61AFEF"
//! level[1].exponent="1.0"
//! level[1].drop_ms="240"
//! ```

use crate::error::ConfigError;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Settings that change with the level.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelSpec {
    /// Colours new blocks are drawn from. The first one is the level's backdrop colour.
    pub palette: Vec<Color>,
    /// Clearing `n` blocks awards `floor(n ^ points_exponent)`.
    pub points_exponent: f64,
    /// Drop animation length.
    pub drop_ms: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Board is `grid_size x grid_size`; odd so the anchor sits dead centre.
    pub grid_size: usize,
    pub cell_px: i32,
    pub cooldown: Duration,
    /// Ascending cumulative-score thresholds; level N needs `checkpoints[N - 1]`.
    pub checkpoints: Vec<u64>,
    pub levels: Vec<LevelSpec>,
    /// Display colour of the anchor.
    pub unbreakable: Color,
    /// Seed for the piece generator.
    pub seed: u32,
}

/// Largest board the terminal front end can address.
pub const MAX_GRID_SIZE: usize = 255;

const RED: Color = Color::Rgb(0xE0, 0x6C, 0x75);
const GREEN: Color = Color::Rgb(0x98, 0xC3, 0x79);
const BLUE: Color = Color::Rgb(0x61, 0xAF, 0xEF);
const YELLOW: Color = Color::Rgb(0xE5, 0xC0, 0x7B);
const MAGENTA: Color = Color::Rgb(0xC6, 0x78, 0xDD);
const CYAN: Color = Color::Rgb(0x56, 0xB6, 0xC2);

impl Default for EngineConfig {
    fn default() -> Self {
        let level = |palette: &[Color], points_exponent: f64, drop_ms: u64| LevelSpec {
            palette: palette.to_vec(),
            points_exponent,
            drop_ms,
        };
        Self {
            grid_size: 9,
            cell_px: 16,
            cooldown: Duration::from_millis(100),
            checkpoints: vec![100, 300, 600, 1000],
            levels: vec![
                level(&[RED, GREEN, BLUE], 1.0, 240),
                level(&[YELLOW, RED, GREEN, BLUE], 1.2, 200),
                level(&[MAGENTA, YELLOW, RED, GREEN, BLUE], 1.4, 170),
                level(&[CYAN, MAGENTA, YELLOW, RED, GREEN, BLUE], 1.6, 140),
                level(&[BLUE, CYAN, MAGENTA, YELLOW, RED, GREEN], 1.8, 110),
            ],
            unbreakable: Color::Rgb(0x5C, 0x63, 0x70),
            seed: 0x1234_5678,
        }
    }
}

impl EngineConfig {
    /// Load from a config file, or the built-in tables when `path` is None or missing.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(p) if p.exists() => {
                let s = std::fs::read_to_string(p)?;
                Self::from_map(&parse_config_file(&s))?
            }
            _ => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    fn from_map(map: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(v) = map.get("grid_size") {
            config.grid_size = parse_value("grid_size", v)?;
        }
        if let Some(v) = map.get("cell_px") {
            config.cell_px = parse_value("cell_px", v)?;
        }
        if let Some(v) = map.get("cooldown_ms") {
            config.cooldown = Duration::from_millis(parse_value("cooldown_ms", v)?);
        }
        if let Some(v) = map.get("seed") {
            config.seed = parse_value("seed", v)?;
        }
        if let Some(v) = map.get("checkpoints") {
            config.checkpoints = v
                .split_whitespace()
                .map(|t| parse_value("checkpoints", t))
                .collect::<Result<_, _>>()?;
        }
        if let Some(v) = map.get("unbreakable") {
            config.unbreakable = parse_hex(v)?;
        }

        // Sorted so `level[2]` can extend from an already-overridden `level[1]`.
        let mut level_keys: Vec<(usize, &str, &String)> = map
            .iter()
            .filter_map(|(k, v)| {
                let (n, field) = parse_level_key(k)?;
                Some((n, field, v))
            })
            .collect();
        level_keys.sort_by_key(|&(n, field, _)| (n, field));
        for (n, field, value) in level_keys {
            let key = format!("level[{n}].{field}");
            if n == 0 {
                return Err(ConfigError::InvalidValue { key, value: value.clone() });
            }
            while config.levels.len() < n {
                let last = config.levels.last().cloned().ok_or_else(|| {
                    ConfigError::Invalid("no level to extend".to_string())
                })?;
                config.levels.push(last);
            }
            let entry = &mut config.levels[n - 1];
            match field {
                "palette" => {
                    entry.palette = value
                        .split_whitespace()
                        .map(parse_hex)
                        .collect::<Result<_, _>>()?;
                }
                "exponent" => entry.points_exponent = parse_value(&key, value)?,
                "drop_ms" => entry.drop_ms = parse_value(&key, value)?,
                _ => return Err(ConfigError::InvalidValue { key, value: value.clone() }),
            }
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_size < 3 || self.grid_size > MAX_GRID_SIZE || self.grid_size % 2 == 0 {
            return Err(ConfigError::Invalid(format!(
                "grid_size must be odd and between 3 and {MAX_GRID_SIZE}, got {}",
                self.grid_size
            )));
        }
        if self.cell_px <= 0 {
            return Err(ConfigError::Invalid("cell_px must be positive".to_string()));
        }
        if self.checkpoints.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ConfigError::Invalid("checkpoints must be strictly ascending".to_string()));
        }
        if self.levels.len() < self.checkpoints.len() + 1 {
            return Err(ConfigError::Invalid(format!(
                "{} checkpoints need {} levels, found {}",
                self.checkpoints.len(),
                self.checkpoints.len() + 1,
                self.levels.len()
            )));
        }
        for (i, level) in self.levels.iter().enumerate() {
            if level.palette.is_empty() {
                return Err(ConfigError::Invalid(format!("level {} has an empty palette", i + 1)));
            }
            if !(level.points_exponent.is_finite() && level.points_exponent > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "level {} has a non-positive points exponent",
                    i + 1
                )));
            }
        }
        Ok(())
    }

    /// Settings for a 0-based level; levels past the table reuse the last entry.
    /// None only for an empty table.
    pub fn level(&self, level: usize) -> Option<&LevelSpec> {
        self.levels.get(level).or_else(|| self.levels.last())
    }

    pub fn exponents(&self) -> Vec<f64> {
        self.levels.iter().map(|l| l.points_exponent).collect()
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// `level[3].palette` -> (3, "palette")
fn parse_level_key(key: &str) -> Option<(usize, &str)> {
    let rest = key.strip_prefix("level[")?;
    let end = rest.find(']')?;
    let n = rest[..end].trim().parse().ok()?;
    let field = rest[end + 1..].strip_prefix('.')?.trim();
    Some((n, field))
}

/// Parse a config file into key -> value map. Comments start with `#`.
fn parse_config_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(eq) = line.find('=') {
            let key = line[..eq].trim();
            let value = line[eq + 1..]
                .trim()
                .trim_matches('"')
                .trim_matches('\'')
                .trim();
            if !key.is_empty() && !value.is_empty() {
                map.insert(key.to_string(), value.to_string());
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ConfigError> {
    let s = s.trim().trim_start_matches('#');
    if !s.is_ascii() {
        return Err(ConfigError::InvalidHex(s.to_string()));
    }
    let channel = |digits: &str| {
        u8::from_str_radix(digits, 16).map_err(|_| ConfigError::InvalidHex(s.to_string()))
    };
    let (r, g, b) = if s.len() == 6 {
        (channel(&s[0..2])?, channel(&s[2..4])?, channel(&s[4..6])?)
    } else if s.len() == 3 {
        (
            channel(&s[0..1])? * 17,
            channel(&s[1..2])? * 17,
            channel(&s[2..3])? * 17,
        )
    } else {
        return Err(ConfigError::InvalidHex(s.to_string()));
    };
    Ok(Color::Rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_6() {
        let c = parse_hex("#98C379").unwrap();
        assert!(matches!(c, Color::Rgb(0x98, 0xC3, 0x79)));
    }

    #[test]
    fn test_parse_hex_3() {
        let c = parse_hex("#FFF").unwrap();
        assert!(matches!(c, Color::Rgb(255, 255, 255)));
        assert!(matches!(parse_hex("#12345"), Err(ConfigError::InvalidHex(_))));
    }

    #[test]
    fn non_ascii_hex_is_an_error() {
        assert!(matches!(parse_hex("aé123"), Err(ConfigError::InvalidHex(_))));
        assert!(matches!(parse_hex("#ééé"), Err(ConfigError::InvalidHex(_))));
        let map = parse_config_file("unbreakable=\"aé123\"");
        assert!(matches!(
            EngineConfig::from_map(&map),
            Err(ConfigError::InvalidHex(_))
        ));
    }

    #[test]
    fn defaults_are_valid() {
        let c = EngineConfig::default();
        c.validate().unwrap();
        assert_eq!(c.level(0).unwrap().palette[0], RED);
        assert_eq!(c.level(99), c.levels.last());
        assert_eq!(EngineConfig { levels: Vec::new(), ..c }.level(0), None);
    }

    #[test]
    fn file_overrides_and_extends_levels() {
        let map = parse_config_file(
            r##"
# comment
grid_size=7
cooldown_ms = "50"
checkpoints="10 20 30 40 50"
level[1].palette="#F00 #0F0"
level[6].exponent='2.5'
"##,
        );
        let c = EngineConfig::from_map(&map).unwrap();
        assert_eq!(c.grid_size, 7);
        assert_eq!(c.cooldown, Duration::from_millis(50));
        assert_eq!(c.checkpoints, vec![10, 20, 30, 40, 50]);
        assert_eq!(c.levels[0].palette, vec![Color::Rgb(255, 0, 0), Color::Rgb(0, 255, 0)]);
        assert_eq!(c.levels.len(), 6);
        assert!((c.levels[5].points_exponent - 2.5).abs() < f64::EPSILON);
        c.validate().unwrap();
    }

    #[test]
    fn validation_rejects_bad_tables() {
        let mut c = EngineConfig::default();
        c.checkpoints = vec![300, 100];
        assert!(c.validate().is_err());

        let mut c = EngineConfig::default();
        c.grid_size = 8;
        assert!(c.validate().is_err());

        let mut c = EngineConfig::default();
        c.checkpoints = vec![1, 2, 3, 4, 5, 6, 7];
        assert!(c.validate().is_err());

        let mut c = EngineConfig::default();
        c.levels[2].palette.clear();
        assert!(c.validate().is_err());

        let mut c = EngineConfig::default();
        c.grid_size = MAX_GRID_SIZE + 2;
        assert!(c.validate().is_err());
        c.grid_size = MAX_GRID_SIZE;
        c.validate().unwrap();

        let mut c = EngineConfig::default();
        c.checkpoints.clear();
        c.levels.clear();
        assert!(c.validate().is_err());
    }

    #[test]
    fn bad_numbers_name_their_key() {
        let map = parse_config_file("grid_size=nine");
        let err = EngineConfig::from_map(&map).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == "grid_size"));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let c = EngineConfig::load(Some(Path::new("/nonexistent/edgefall.conf"))).unwrap();
        assert_eq!(c, EngineConfig::default());
    }
}
