use serde::{Deserialize, Serialize};

const MIN_NAME_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: i64,
    pub name: String,
    pub last_name: String,
}

/// Body of create and update requests.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterInput {
    pub name: String,
    pub last_name: String,
}

impl CharacterInput {
    pub fn validate(&self) -> Result<(), String> {
        let mut issues = Vec::new();
        if self.name.chars().count() < MIN_NAME_LEN {
            issues.push(format!("name must be at least {MIN_NAME_LEN} characters"));
        }
        if self.last_name.chars().count() < MIN_NAME_LEN {
            issues.push(format!("lastName must be at least {MIN_NAME_LEN} characters"));
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues.join("; "))
        }
    }

    pub fn into_character(self, id: i64) -> Character {
        Character {
            id,
            name: self.name,
            last_name: self.last_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_every_short_field() {
        let input = CharacterInput {
            name: "Luke".into(),
            last_name: "Sky".into(),
        };

        let err = input.validate().unwrap_err();
        assert!(err.contains("name"));
        assert!(err.contains("lastName"));
    }

    #[test]
    fn accepts_long_enough_names() {
        let input = CharacterInput {
            name: "Anakin".into(),
            last_name: "Skywalker".into(),
        };

        assert!(input.validate().is_ok());
    }
}
