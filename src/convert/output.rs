use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::convert::tern;

/// Result of `convert_read_library_to_file`: converted data keyed by read library name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConvertReadLibraryOutput {
    #[serde(default)]
    pub files: BTreeMap<String, ConvertedReadLibrary>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One converted set of reads
///
/// Only the file paths that apply are present: `fwd`/`rev` for paired files, `inter` for
/// interleaved reads, `sing` for single end reads. Statistics are absent when unknown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConvertedReadLibrary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fwd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sing: Option<String>,
    /// Workspace reference of the reads object, workspace_id/object_id/version
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "tern")]
    pub single_genome: Option<bool>,
    /// Always false for single end reads
    #[serde(default, skip_serializing_if = "Option::is_none", with = "tern")]
    pub read_orientation_outward: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequencing_tech: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strain: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert_size_mean: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert_size_std_dev: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gc_content: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ConvertedReadLibrary {
    /// Labelled paths of the files actually produced, in fwd, rev, inter, sing order
    pub fn file_paths(&self) -> Vec<(&'static str, &str)> {
        [("fwd", &self.fwd), ("rev", &self.rev), ("inter", &self.inter), ("sing", &self.sing)]
            .into_iter()
            .filter_map(|(label, path)| path.as_deref().map(|p| (label, p)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_server_output() {
        let output: ConvertReadLibraryOutput = serde_json::from_value(json!({
            "files": {
                "frbasic": {
                    "fwd": "/kb/module/work/tmp/1_fwd.fq",
                    "rev": "/kb/module/work/tmp/1_rev.fq",
                    "ref": "12/3/1",
                    "single_genome": "true",
                    "read_orientation_outward": "false",
                    "sequencing_tech": "Illumina",
                    "strain": null,
                    "insert_size_mean": 42.5,
                    "read_count": 1000,
                    "otherfield": "kept"
                }
            }
        }))
        .unwrap();

        let lib = &output.files["frbasic"];
        assert_eq!(lib.reference.as_deref(), Some("12/3/1"));
        assert_eq!(lib.single_genome, Some(true));
        assert_eq!(lib.read_orientation_outward, Some(false));
        assert_eq!(lib.strain, None);
        assert_eq!(lib.read_count, Some(1000));
        assert_eq!(lib.extra.get("otherfield"), Some(&json!("kept")));
        assert_eq!(
            lib.file_paths(),
            vec![("fwd", "/kb/module/work/tmp/1_fwd.fq"), ("rev", "/kb/module/work/tmp/1_rev.fq")]
        );
    }

    #[test]
    fn serialises_only_present_fields() {
        let lib = ConvertedReadLibrary {
            sing: Some("/tmp/se.fq.gz".to_string()),
            reference: Some("1/2/3".to_string()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&lib).unwrap(), json!({"sing": "/tmp/se.fq.gz", "ref": "1/2/3"}));
    }
}
