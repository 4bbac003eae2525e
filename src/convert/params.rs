use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::convert::tern;

/// Input of `convert_read_library_to_file`
///
/// - `workspace_name`: workspace the read libraries are taken from
/// - `read_libraries`: read library objects to convert, either a plain list or a map from
///   library to output file name prefix
/// - `gzip`: true gzips unzipped files, false gunzips zipped files. Unset leaves files as they
///   are, unless (de)interleaving needs them unzipped, in which case they stay unzipped
/// - `interleaved`: true provides interleaved files, false forward and reverse files, unset
///   leaves them as they are
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertReadLibraryParams {
    pub workspace_name: String,
    pub read_libraries: ReadLibraries,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "tern")]
    pub gzip: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "tern", alias = "interlaced")]
    pub interleaved: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ConvertReadLibraryParams {
    pub fn new<I, S>(workspace_name: &str, read_libraries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ConvertReadLibraryParams {
            workspace_name: workspace_name.to_string(),
            read_libraries: ReadLibraries::List(read_libraries.into_iter().map(Into::into).collect()),
            gzip: None,
            interleaved: None,
            extra: Map::new(),
        }
    }

    /// Request naming the output files of each library by the given prefix
    pub fn with_prefixes<I, K, V>(workspace_name: &str, read_libraries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        ConvertReadLibraryParams {
            read_libraries: ReadLibraries::Prefixed(
                read_libraries.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            ),
            ..Self::new(workspace_name, Vec::<String>::new())
        }
    }

    pub fn gzip(mut self, gzip: bool) -> Self {
        self.gzip = Some(gzip);
        self
    }

    pub fn interleaved(mut self, interleaved: bool) -> Self {
        self.interleaved = Some(interleaved);
        self
    }
}

/// The libraries of a request, in either accepted form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReadLibraries {
    List(Vec<String>),
    /// Library reference to output file name prefix
    Prefixed(BTreeMap<String, String>),
}

impl ReadLibraries {
    pub fn len(&self) -> usize {
        match self {
            ReadLibraries::List(libraries) => libraries.len(),
            ReadLibraries::Prefixed(libraries) => libraries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn names(&self) -> Vec<&str> {
        match self {
            ReadLibraries::List(libraries) => libraries.iter().map(String::as_str).collect(),
            ReadLibraries::Prefixed(libraries) => libraries.keys().map(String::as_str).collect(),
        }
    }

    /// Prefixes given to more than one library; their output files would collide
    pub fn duplicate_prefixes(&self) -> Vec<&str> {
        let ReadLibraries::Prefixed(libraries) = self else {
            return Vec::new();
        };
        let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
        for prefix in libraries.values() {
            *seen.entry(prefix.as_str()).or_default() += 1;
        }
        seen.into_iter().filter(|(_, n)| *n > 1).map(|(prefix, _)| prefix).collect()
    }
}
