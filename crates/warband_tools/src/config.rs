//! Campaign rules configuration.
//!
//! Groups that play with house rules can override the campaign constants
//! with a RON file; any field left out keeps its default.
//!
//! ```ron
//! (
//!     points_per_win: 200,
//!     underdog_point_divisor: 25,
//! )
//! ```

use std::path::Path;

use warband_core::campaign::CampaignRules;

use crate::{read_file, Result, ToolError};

/// Parse rules from RON text.
pub fn parse_rules(text: &str, origin: &str) -> Result<CampaignRules> {
    ron::from_str(text).map_err(|e| ToolError::Config {
        path: origin.to_string(),
        message: e.to_string(),
    })
}

/// Load rules from a RON file, or the defaults when no file is given.
pub fn load_rules(path: Option<&Path>) -> Result<CampaignRules> {
    match path {
        Some(path) => {
            let rules = parse_rules(&read_file(path)?, &path.display().to_string())?;
            tracing::debug!("Loaded campaign rules from {}", path.display());
            Ok(rules)
        }
        None => Ok(CampaignRules::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_override() {
        let rules = parse_rules("(points_per_win: 200)", "inline").unwrap();
        assert_eq!(rules.points_per_win, 200);
        assert_eq!(rules.points_per_loss, 300);
    }

    #[test]
    fn test_defaults_without_file() {
        assert_eq!(load_rules(None).unwrap(), CampaignRules::default());
    }

    #[test]
    fn test_bad_ron_is_config_error() {
        assert!(matches!(
            parse_rules("(points_per_win: \"lots\")", "inline"),
            Err(ToolError::Config { .. })
        ));
    }
}
