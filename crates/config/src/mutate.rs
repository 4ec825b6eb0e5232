//! Config document mutation: collection additions and Trakt token storage.

use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::model::TraktAuthorization;
use crate::{Config, ConfigError};

/// What a merge did to the stored method value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The method was absent and has been set.
    Set,
    /// The value was appended to the existing comma-separated string.
    Appended,
    /// The value was already present; nothing changed.
    AlreadyPresent,
    /// The existing value was not a string and has been replaced.
    Replaced,
}

impl Config {
    /// Merge `value` into `collections.<collection>.<method>`.
    ///
    /// String values accumulate as `"old, new"`; a value already contained in
    /// the stored string is a no-op. The caller is responsible for
    /// [`Config::save`] afterwards.
    pub fn merge_collection_value(
        &mut self,
        collection: &str,
        method: &str,
        value: &str,
    ) -> Result<MergeOutcome, ConfigError> {
        if method == "movie" {
            return Err(ConfigError::UnsupportedMethod(method.to_string()));
        }

        let root = self
            .doc
            .as_mapping_mut()
            .ok_or(ConfigError::NotAMapping("config"))?;
        if !root.contains_key("collections") {
            root.insert("collections".into(), Value::Mapping(Mapping::new()));
        }
        let collections = root
            .get_mut("collections")
            .and_then(|v| v.as_mapping_mut())
            .ok_or(ConfigError::NotAMapping("collections"))?;

        if !collections.contains_key(collection) {
            collections.insert(collection.into(), Value::Mapping(Mapping::new()));
        }
        let entry = collections
            .get_mut(collection)
            .and_then(|v| v.as_mapping_mut())
            .ok_or(ConfigError::NotAMapping("collection entry"))?;

        let outcome = match entry.get(method) {
            None => {
                entry.insert(method.into(), value.into());
                MergeOutcome::Set
            }
            Some(existing) if stringify(existing).contains(value) => MergeOutcome::AlreadyPresent,
            Some(Value::String(existing)) => {
                let merged = format!("{existing}, {value}");
                entry.insert(method.into(), merged.into());
                MergeOutcome::Appended
            }
            Some(_) => {
                entry.insert(method.into(), value.into());
                MergeOutcome::Replaced
            }
        };

        debug!(collection, method, value, ?outcome, "merged config value");
        Ok(outcome)
    }

    /// Replace `trakt.authorization` with a freshly obtained token.
    pub fn set_trakt_authorization(
        &mut self,
        auth: &TraktAuthorization,
    ) -> Result<(), ConfigError> {
        let trakt = self
            .doc
            .get_mut("trakt")
            .ok_or(ConfigError::MissingSection("trakt"))?
            .as_mapping_mut()
            .ok_or(ConfigError::NotAMapping("trakt"))?;
        trakt.insert("authorization".into(), serde_yaml::to_value(auth)?);

        if let Some(view) = self.trakt.as_mut() {
            view.authorization = Some(auth.clone());
        }
        Ok(())
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => serde_yaml::to_string(other).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::PathBuf;

    use super::*;

    const SAMPLE: &str = r#"
plex:
  url: http://localhost:32400
  token: plex-token
  movie_library: Movies
trakt:
  client_id: cid
  client_secret: secret
collections:
  Dinosaurs:
    genres: Dinosaurs
    year: 1993
"#;

    fn load_sample() -> Config {
        let doc: serde_yaml::Value = serde_yaml::from_str(SAMPLE).unwrap();
        Config::from_document(PathBuf::from("config.yml"), doc).unwrap()
    }

    #[test]
    fn append_extends_comma_separated_string() {
        let mut config = load_sample();
        let outcome = config
            .merge_collection_value("Dinosaurs", "genres", "Monsters")
            .unwrap();
        assert_eq!(outcome, MergeOutcome::Appended);
        let entry = &config.collections()[0];
        assert_eq!(
            entry.methods[0].values,
            vec!["Dinosaurs".to_string(), "Monsters".to_string()]
        );
    }

    #[test]
    fn existing_value_is_a_no_op() {
        let mut config = load_sample();
        let outcome = config
            .merge_collection_value("Dinosaurs", "genres", "Dinosaurs")
            .unwrap();
        assert_eq!(outcome, MergeOutcome::AlreadyPresent);
    }

    #[test]
    fn non_string_value_is_replaced() {
        let mut config = load_sample();
        let outcome = config
            .merge_collection_value("Dinosaurs", "year", "1994")
            .unwrap();
        assert_eq!(outcome, MergeOutcome::Replaced);
        let entry = &config.collections()[0];
        let years = entry.methods.iter().find(|m| m.name == "year").unwrap();
        assert_eq!(years.values, vec!["1994"]);
    }

    #[test]
    fn absent_collection_and_method_are_created() {
        let mut config = load_sample();
        let outcome = config
            .merge_collection_value("New Wave", "trakt-list", "user/new-wave")
            .unwrap();
        assert_eq!(outcome, MergeOutcome::Set);
        assert!(config.collections().iter().any(|c| c.name == "New Wave"));
    }

    #[test]
    fn movie_method_is_rejected() {
        let mut config = load_sample();
        let err = config
            .merge_collection_value("Dinosaurs", "movie", "Jurassic Park")
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedMethod(_)));
    }

    #[test]
    fn trakt_authorization_is_written_back_and_survives_reload() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let mut config = Config::load(file.path()).unwrap();
        let auth = TraktAuthorization {
            access_token: "new-at".into(),
            token_type: "Bearer".into(),
            expires_in: 7776000,
            refresh_token: "new-rt".into(),
            scope: "public".into(),
            created_at: 1_700_000_000,
        };
        config.set_trakt_authorization(&auth).unwrap();
        config.save().unwrap();

        let reloaded = Config::load(file.path()).unwrap();
        assert_eq!(reloaded.trakt.as_ref().unwrap().authorization, Some(auth));
        // Untouched sections survive the rewrite.
        assert_eq!(reloaded.plex.token, "plex-token");
        assert_eq!(reloaded.collections().len(), 1);
    }
}
