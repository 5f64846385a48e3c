use serde::Serialize;

use crate::models::{JsonResume, Resume};

const FALLBACK_NAME: &str = "export";

/// A downloadable JSON Resume file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportArtifact {
    pub file_name: String,
    pub contents: String,
}

impl ExportArtifact {
    pub fn for_resume(resume: &Resume) -> Result<Self, serde_json::Error> {
        Ok(Self {
            file_name: export_file_name(&resume.basics.name),
            contents: to_export_json(resume)?,
        })
    }
}

/// Serializes a document as 2-space indented JSON Resume.
pub fn to_export_json(resume: &Resume) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&JsonResume::from(resume))
}

/// `resume-<name>.json`, or `resume-export.json` when the name is blank.
///
/// Path separators, quotes and control characters are replaced with `_` so
/// the result is usable both as a file name and inside a
/// `Content-Disposition` header.
pub fn export_file_name(name: &str) -> String {
    let name = name.trim();
    let stem: String = if name.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        name.chars()
            .map(|c| match c {
                '/' | '\\' | '"' => '_',
                c if c.is_control() => '_',
                c => c,
            })
            .collect()
    };
    format!("resume-{stem}.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::records::{Location, Profile};
    use crate::models::{Project, Skill, WorkExperience};

    fn filled_resume() -> Resume {
        let mut resume = Resume::new();
        resume.basics.name = "Ada Lovelace".to_string();
        resume.basics.summary = "Analyst \"of engines\"\nand notes".to_string();
        resume.basics.location = Location {
            city: "London".to_string(),
            country_code: "GB".to_string(),
            ..Default::default()
        };
        resume.basics.profiles.push(Profile {
            network: "GitHub".to_string(),
            username: "ada".to_string(),
            url: "https://github.com/ada".to_string(),
        });
        resume.work.push(WorkExperience {
            name: "Analytical Engine Co".to_string(),
            position: "Programmer".to_string(),
            highlights: vec!["First published algorithm".to_string()],
            ..Default::default()
        });
        resume.skills.push(Skill {
            name: "Mathematics".to_string(),
            level: "Expert".to_string(),
            keywords: vec!["Bernoulli numbers".to_string()],
        });
        resume.projects.push(Project {
            name: "Note G".to_string(),
            ..Default::default()
        });
        resume
    }

    #[test]
    fn test_file_name_uses_basics_name() {
        assert_eq!(export_file_name("Ada Lovelace"), "resume-Ada Lovelace.json");
    }

    #[test]
    fn test_file_name_falls_back_when_blank() {
        assert_eq!(export_file_name(""), "resume-export.json");
        assert_eq!(export_file_name("   "), "resume-export.json");
    }

    #[test]
    fn test_file_name_replaces_unsafe_characters() {
        assert_eq!(export_file_name("a/b\\c\"d\ne"), "resume-a_b_c_d_e.json");
    }

    #[test]
    fn test_export_is_two_space_indented() {
        let json = to_export_json(&filled_resume()).unwrap();
        assert!(json.starts_with("{\n  \"basics\": {\n    \"name\": \"Ada Lovelace\""));
    }

    #[test]
    fn test_export_excludes_ids_and_timestamps() {
        let value: serde_json::Value =
            serde_json::from_str(&to_export_json(&filled_resume()).unwrap()).unwrap();
        assert!(value.get("id").is_none());
        assert!(value.get("createdAt").is_none());
        assert!(value.get("updatedAt").is_none());
        assert!(value["work"][0].get("id").is_none());
    }

    #[test]
    fn test_export_parses_back_to_the_same_content() {
        let resume = filled_resume();
        let json = to_export_json(&resume).unwrap();
        let parsed: JsonResume = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, JsonResume::from(&resume));
        // And re-serializing is byte-for-byte identical.
        assert_eq!(serde_json::to_string_pretty(&parsed).unwrap(), json);
    }

    #[test]
    fn test_artifact_for_resume() {
        let artifact = ExportArtifact::for_resume(&filled_resume()).unwrap();
        assert_eq!(artifact.file_name, "resume-Ada Lovelace.json");
        assert!(artifact.contents.contains("\"Bernoulli numbers\""));
    }
}
