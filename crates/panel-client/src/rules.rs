//! Local detect-rule loading
//!
//! Rules come from a plain-text file, one pattern per line, loaded once
//! at startup and read-only afterwards (a reload requires a restart).
//! An unreadable file degrades to an empty rule set with a warning; a
//! line that fails to compile is fatal to startup. That asymmetry is
//! intentional and must stay.

use regex::Regex;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::Error;
use crate::models::{DetectRule, LOCAL_RULE_ID};

/// Load the local rule list.
///
/// `None` or an empty path means auditing is disabled: no file access,
/// empty result, no error.
pub fn load_local_rules(path: Option<&Path>) -> Result<Vec<DetectRule>, Error> {
    let Some(path) = path.filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(Vec::new());
    };

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            warn!(path = %path.display(), error = %err,
                "failed to read rule file, auditing disabled");
            return Ok(Vec::new());
        }
    };

    let mut rules = Vec::new();
    for line in content.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }
        let pattern = Regex::new(line).map_err(|source| Error::RulePattern {
            pattern: line.to_string(),
            source,
        })?;
        rules.push(DetectRule {
            id: LOCAL_RULE_ID,
            pattern,
        });
    }

    debug!(path = %path.display(), count = rules.len(), "loaded local detect rules");
    Ok(rules)
}
