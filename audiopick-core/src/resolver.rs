//! Turns a CLI mode into the word, reading and card an audio lookup is for.

use crate::config::RecordStoreConfig;
use crate::error::{CoreError, Result};
use crate::format::{build_record_query, normalize_reading};
use crate::provider::Identifier;
use crate::record::{RecordId, RecordStore};
use std::collections::HashMap;
use tracing::{debug, info};

/// How the word to look up is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveMode {
    /// Use the given word and reading as-is; no card is involved.
    Direct(Identifier),
    /// Find exactly one card whose word (or key) field equals `word`.
    ByQuery { word: String, search_key: bool },
    /// Use the card currently shown in the reviewer.
    ByContext,
}

/// Outcome of resolution: what to look up and which card (if any) to attach to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub identifier: Identifier,
    pub record_id: Option<RecordId>,
}

impl Resolution {
    #[must_use]
    pub const fn can_attach(&self) -> bool {
        self.record_id.is_some()
    }
}

pub struct RecordResolver<'a> {
    store: &'a dyn RecordStore,
    config: &'a RecordStoreConfig,
}

impl<'a> RecordResolver<'a> {
    #[must_use]
    pub fn new(store: &'a dyn RecordStore, config: &'a RecordStoreConfig) -> Self {
        Self { store, config }
    }

    /// Resolve a mode to an identifier and optional card.
    ///
    /// For card-backed modes, `lookup_override` replaces the word and reading
    /// read from the card while keeping the card as the attachment target.
    /// It is ignored in direct mode, which already carries its own identifier.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AmbiguousMatch`] or [`CoreError::NoMatch`] when a
    /// query does not identify exactly one card, [`CoreError::MissingField`]
    /// when the card lacks the word or reading field, and any store error.
    pub fn resolve(
        &self,
        mode: &ResolveMode,
        lookup_override: Option<&Identifier>,
    ) -> Result<Resolution> {
        match mode {
            ResolveMode::Direct(identifier) => {
                debug!("Direct lookup for {identifier}, no card");
                Ok(Resolution {
                    identifier: identifier.clone(),
                    record_id: None,
                })
            }
            ResolveMode::ByQuery { word, search_key } => {
                self.resolve_by_query(word, *search_key, lookup_override)
            }
            ResolveMode::ByContext => self.resolve_by_context(lookup_override),
        }
    }

    fn resolve_by_query(
        &self,
        word: &str,
        search_key: bool,
        lookup_override: Option<&Identifier>,
    ) -> Result<Resolution> {
        let field = if search_key {
            &self.config.key_field
        } else {
            &self.config.word_field
        };
        let query = build_record_query(&self.config.note_type, field, word);
        info!("Searching cards: {query}");

        let ids = self.store.find_records(&query)?;
        if ids.is_empty() {
            return Err(CoreError::NoMatch { query });
        }

        let records = self.store.records_info(&ids)?;
        if ids.len() > 1 {
            let matches = records
                .iter()
                .map(|r| {
                    r.field(&self.config.key_field)
                        .map_or_else(|| format!("<card {}>", r.id), str::to_owned)
                })
                .collect();
            return Err(CoreError::AmbiguousMatch { matches });
        }

        let Some(record) = records.into_iter().next() else {
            return Err(CoreError::NoMatch { query });
        };
        let identifier = self.identifier_from_fields(&record.fields, lookup_override)?;
        info!("Resolved card {} to {identifier}", record.id);

        Ok(Resolution {
            identifier,
            record_id: Some(record.id),
        })
    }

    fn resolve_by_context(&self, lookup_override: Option<&Identifier>) -> Result<Resolution> {
        let viewed = self.store.current_view()?;
        let record_id = self
            .store
            .view_to_record(&[viewed.view_id])?
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::NoMatch {
                query: format!("card {}", viewed.view_id),
            })?;
        let identifier = self.identifier_from_fields(&viewed.fields, lookup_override)?;
        info!("Resolved current card {} (note {record_id}) to {identifier}", viewed.view_id);

        Ok(Resolution {
            identifier,
            record_id: Some(record_id),
        })
    }

    fn identifier_from_fields(
        &self,
        fields: &HashMap<String, String>,
        lookup_override: Option<&Identifier>,
    ) -> Result<Identifier> {
        if let Some(identifier) = lookup_override {
            debug!("Using override {identifier} instead of card fields");
            return Ok(identifier.clone());
        }

        let word = self.required_field(fields, &self.config.word_field)?;
        let reading = normalize_reading(self.required_field(fields, &self.config.reading_field)?);
        let reading = Some(reading).filter(|r| !r.trim().is_empty());

        Ok(Identifier::new(word).with_optional_reading(reading))
    }

    fn required_field<'f>(
        &self,
        fields: &'f HashMap<String, String>,
        name: &str,
    ) -> Result<&'f str> {
        fields
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| CoreError::MissingField {
                field: name.to_string(),
            })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::record::{Record, RecordUpdate, ViewId, ViewedRecord};
    use std::cell::RefCell;

    /// In-memory store that records every call it receives.
    #[derive(Default)]
    pub(crate) struct FakeStore {
        pub records: Vec<Record>,
        pub viewed: Option<ViewedRecord>,
        pub view_owner: Option<RecordId>,
        pub reject_update: Option<String>,
        pub calls: RefCell<Vec<String>>,
        pub updates: RefCell<Vec<RecordUpdate>>,
    }

    impl FakeStore {
        pub(crate) fn with_records(records: Vec<Record>) -> Self {
            Self {
                records,
                ..Self::default()
            }
        }
    }

    impl RecordStore for FakeStore {
        fn find_records(&self, query: &str) -> Result<Vec<RecordId>> {
            self.calls.borrow_mut().push(format!("findNotes {query}"));
            Ok(self.records.iter().map(|r| r.id).collect())
        }

        fn records_info(&self, ids: &[RecordId]) -> Result<Vec<Record>> {
            self.calls.borrow_mut().push("notesInfo".into());
            Ok(self
                .records
                .iter()
                .filter(|r| ids.contains(&r.id))
                .cloned()
                .collect())
        }

        fn current_view(&self) -> Result<ViewedRecord> {
            self.calls.borrow_mut().push("guiCurrentCard".into());
            self.viewed.clone().ok_or_else(|| CoreError::RecordStore {
                action: "guiCurrentCard".into(),
                reason: "not in review".into(),
            })
        }

        fn view_to_record(&self, _views: &[ViewId]) -> Result<Vec<RecordId>> {
            self.calls.borrow_mut().push("cardsToNotes".into());
            Ok(self.view_owner.into_iter().collect())
        }

        fn update_record_fields(&self, update: &RecordUpdate) -> Result<()> {
            self.calls.borrow_mut().push("updateNoteFields".into());
            self.updates.borrow_mut().push(update.clone());
            match &self.reject_update {
                Some(reason) => Err(CoreError::UpdateRejected {
                    reason: reason.clone(),
                }),
                None => Ok(()),
            }
        }
    }

    pub(crate) fn card(id: i64, key: &str, word: &str, reading: &str) -> Record {
        Record {
            id: RecordId(id),
            fields: HashMap::from([
                ("Key".to_string(), key.to_string()),
                ("Word".to_string(), word.to_string()),
                ("WordReading".to_string(), reading.to_string()),
            ]),
        }
    }

    #[test]
    fn test_direct_has_no_record() {
        let store = FakeStore::default();
        let config = RecordStoreConfig::default();
        let resolver = RecordResolver::new(&store, &config);
        let identifier = Identifier::new("木").with_reading("き");

        let resolution = resolver
            .resolve(&ResolveMode::Direct(identifier.clone()), None)
            .unwrap();

        assert_eq!(resolution.identifier, identifier);
        assert!(!resolution.can_attach());
        assert!(store.calls.borrow().is_empty());
    }

    #[test]
    fn test_query_single_match_normalizes_reading() {
        let store =
            FakeStore::with_records(vec![card(7, "掛け橋", "掛け橋", "掛け&nbsp;橋[はし]")]);
        let config = RecordStoreConfig::default();
        let resolver = RecordResolver::new(&store, &config);

        let resolution = resolver
            .resolve(
                &ResolveMode::ByQuery {
                    word: "掛け橋".into(),
                    search_key: false,
                },
                None,
            )
            .unwrap();

        assert_eq!(resolution.record_id, Some(RecordId(7)));
        assert_eq!(resolution.identifier.word, "掛け橋");
        assert_eq!(resolution.identifier.reading(), Some("掛けはし"));
        assert_eq!(
            store.calls.borrow()[0],
            "findNotes \"note:JP Mining Note\" \"Word:掛け橋\""
        );
    }

    #[test]
    fn test_query_by_key_field() {
        let store = FakeStore::with_records(vec![card(7, "木", "木", "木[き]")]);
        let config = RecordStoreConfig::default();
        let resolver = RecordResolver::new(&store, &config);

        resolver
            .resolve(
                &ResolveMode::ByQuery {
                    word: "木".into(),
                    search_key: true,
                },
                None,
            )
            .unwrap();

        assert_eq!(
            store.calls.borrow()[0],
            "findNotes \"note:JP Mining Note\" \"Key:木\""
        );
    }

    #[test]
    fn test_query_ambiguous_reports_keys() {
        let store = FakeStore::with_records(vec![
            card(1, "橋(はし)", "橋", "橋[はし]"),
            card(2, "橋(きょう)", "橋", "橋[きょう]"),
        ]);
        let config = RecordStoreConfig::default();
        let resolver = RecordResolver::new(&store, &config);

        let err = resolver
            .resolve(
                &ResolveMode::ByQuery {
                    word: "橋".into(),
                    search_key: false,
                },
                None,
            )
            .unwrap_err();

        match err {
            CoreError::AmbiguousMatch { matches } => {
                assert_eq!(matches, vec!["橋(はし)", "橋(きょう)"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_query_no_match() {
        let store = FakeStore::default();
        let config = RecordStoreConfig::default();
        let resolver = RecordResolver::new(&store, &config);

        let err = resolver
            .resolve(
                &ResolveMode::ByQuery {
                    word: "木".into(),
                    search_key: false,
                },
                None,
            )
            .unwrap_err();

        assert!(matches!(err, CoreError::NoMatch { .. }));
        assert_eq!(store.calls.borrow().len(), 1);
    }

    #[test]
    fn test_override_takes_precedence_over_card() {
        let store = FakeStore::with_records(vec![card(3, "木", "木", "木[き]")]);
        let config = RecordStoreConfig::default();
        let resolver = RecordResolver::new(&store, &config);
        let replacement = Identifier::new("樹").with_reading("じゅ");

        let resolution = resolver
            .resolve(
                &ResolveMode::ByQuery {
                    word: "木".into(),
                    search_key: false,
                },
                Some(&replacement),
            )
            .unwrap();

        assert_eq!(resolution.identifier, replacement);
        assert_eq!(resolution.record_id, Some(RecordId(3)));
    }

    #[test]
    fn test_missing_reading_field() {
        let mut record = card(3, "木", "木", "");
        record.fields.remove("WordReading");
        let store = FakeStore::with_records(vec![record]);
        let config = RecordStoreConfig::default();
        let resolver = RecordResolver::new(&store, &config);

        let err = resolver
            .resolve(
                &ResolveMode::ByQuery {
                    word: "木".into(),
                    search_key: false,
                },
                None,
            )
            .unwrap_err();

        assert!(matches!(err, CoreError::MissingField { ref field } if field == "WordReading"));
    }

    #[test]
    fn test_empty_reading_becomes_none() {
        let store = FakeStore::with_records(vec![card(3, "木", "木", " ")]);
        let config = RecordStoreConfig::default();
        let resolver = RecordResolver::new(&store, &config);

        let resolution = resolver
            .resolve(
                &ResolveMode::ByQuery {
                    word: "木".into(),
                    search_key: false,
                },
                None,
            )
            .unwrap();

        assert_eq!(resolution.identifier.reading(), None);
    }

    #[test]
    fn test_context_maps_view_to_owner() {
        let store = FakeStore {
            viewed: Some(ViewedRecord {
                view_id: ViewId(99),
                fields: card(0, "木", "木", "木[き]").fields,
            }),
            view_owner: Some(RecordId(42)),
            ..FakeStore::default()
        };
        let config = RecordStoreConfig::default();
        let resolver = RecordResolver::new(&store, &config);

        let resolution = resolver.resolve(&ResolveMode::ByContext, None).unwrap();

        assert_eq!(resolution.record_id, Some(RecordId(42)));
        assert_eq!(resolution.identifier, Identifier::new("木").with_reading("き"));
        assert_eq!(*store.calls.borrow(), vec!["guiCurrentCard", "cardsToNotes"]);
    }

    #[test]
    fn test_context_without_owner_is_no_match() {
        let store = FakeStore {
            viewed: Some(ViewedRecord {
                view_id: ViewId(99),
                fields: HashMap::new(),
            }),
            ..FakeStore::default()
        };
        let config = RecordStoreConfig::default();
        let resolver = RecordResolver::new(&store, &config);

        let err = resolver.resolve(&ResolveMode::ByContext, None).unwrap_err();
        assert!(matches!(err, CoreError::NoMatch { .. }));
    }
}
