//! Exam type allow-list, collection naming and per-exam header aliases

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Prefix of every merit list collection name
pub const MERIT_LIST_PREFIX: &str = "MeritList_";

/// Exam bodies whose result documents can be ingested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExamType {
    Jee,
    Cet,
    Me,
    Dse,
}

impl ExamType {
    /// All exam types in matcher scan order
    pub const ALL: [ExamType; 4] = [ExamType::Jee, ExamType::Cet, ExamType::Me, ExamType::Dse];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jee => "JEE",
            Self::Cet => "CET",
            Self::Me => "ME",
            Self::Dse => "DSE",
        }
    }

    /// Header spellings used by this exam body's result tables
    pub fn fields(&self) -> &'static ExamFields {
        match self {
            Self::Jee => &JEE_FIELDS,
            Self::Cet => &CET_FIELDS,
            Self::Me => &ME_FIELDS,
            Self::Dse => &DSE_FIELDS,
        }
    }

    /// Download filename for this exam's merit list
    pub fn export_filename(&self) -> String {
        format!("{}_merit_list.csv", self.as_str())
    }
}

impl fmt::Display for ExamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExamType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ExamType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                Error::validation(format!(
                    "Invalid exam type '{}'; expected one of JEE, CET, ME, DSE",
                    s
                ))
            })
    }
}

/// Literal header names for the semantic fields of one exam body.
///
/// Exam bodies spell the same column differently, and the extraction tool
/// leaves line breaks from wrapped header cells inside the names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExamFields {
    pub application_id: &'static str,
    pub full_name: &'static str,
    /// Column a merit list is sorted by; `None` when the exam has no ranking
    pub rank: Option<&'static str>,
    pub category: &'static str,
    /// Numeric score used for distribution analytics
    pub score: Option<&'static str>,
}

const FULL_NAME: &str = "Candidate's Full Name";
const CATEGORY: &str = "Category";

static JEE_FIELDS: ExamFields = ExamFields {
    application_id: "Application\rID",
    full_name: FULL_NAME,
    rank: Some("Merit\rNo"),
    category: CATEGORY,
    score: None,
};

static CET_FIELDS: ExamFields = ExamFields {
    application_id: "Application\rID",
    full_name: FULL_NAME,
    rank: Some("Merit\rNo"),
    category: CATEGORY,
    score: Some("Percentile\r_Mark"),
};

static ME_FIELDS: ExamFields = ExamFields {
    application_id: "Application ID",
    full_name: FULL_NAME,
    rank: Some("State\rGeneral\rMerit No"),
    category: CATEGORY,
    score: None,
};

static DSE_FIELDS: ExamFields = ExamFields {
    application_id: "Application\rID",
    full_name: FULL_NAME,
    rank: None,
    category: CATEGORY,
    score: None,
};

/// Whether a collection holds raw exam rows or promoted merit list entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    Raw,
    MeritList,
}

/// Name of a record collection. Only constructible from an [`ExamType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollectionName {
    exam_type: ExamType,
    kind: CollectionKind,
}

impl CollectionName {
    /// Raw collection holding ingested rows for an exam
    pub fn raw(exam_type: ExamType) -> Self {
        Self {
            exam_type,
            kind: CollectionKind::Raw,
        }
    }

    /// Merit list collection derived from an exam type
    pub fn merit_list(exam_type: ExamType) -> Self {
        Self {
            exam_type,
            kind: CollectionKind::MeritList,
        }
    }

    pub fn exam_type(&self) -> ExamType {
        self.exam_type
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    /// Store-level name (`CET`, `MeritList_CET`)
    pub fn as_string(&self) -> String {
        match self.kind {
            CollectionKind::Raw => self.exam_type.as_str().to_string(),
            CollectionKind::MeritList => format!("{}{}", MERIT_LIST_PREFIX, self.exam_type.as_str()),
        }
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}

impl Serialize for CollectionName {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_allow_list() {
        assert_eq!("JEE".parse::<ExamType>().unwrap(), ExamType::Jee);
        assert_eq!("DSE".parse::<ExamType>().unwrap(), ExamType::Dse);
        assert!(matches!("jee".parse::<ExamType>(), Err(Error::Validation(_))));
        assert!(matches!("GATE".parse::<ExamType>(), Err(Error::Validation(_))));
        assert!(matches!("MeritList_CET".parse::<ExamType>(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_collection_names() {
        assert_eq!(CollectionName::raw(ExamType::Cet).to_string(), "CET");
        assert_eq!(
            CollectionName::merit_list(ExamType::Me).to_string(),
            "MeritList_ME"
        );
        assert_eq!(ExamType::Jee.export_filename(), "JEE_merit_list.csv");
    }

    #[test]
    fn test_field_aliases() {
        assert_eq!(ExamType::Me.fields().application_id, "Application ID");
        assert_eq!(ExamType::Jee.fields().application_id, "Application\rID");
        assert_eq!(ExamType::Cet.fields().rank, Some("Merit\rNo"));
        assert_eq!(ExamType::Me.fields().rank, Some("State\rGeneral\rMerit No"));
        assert_eq!(ExamType::Dse.fields().rank, None);
    }

    #[test]
    fn test_serde_tags() {
        assert_eq!(serde_json::to_string(&ExamType::Cet).unwrap(), "\"CET\"");
        let parsed: ExamType = serde_json::from_str("\"ME\"").unwrap();
        assert_eq!(parsed, ExamType::Me);
    }
}
