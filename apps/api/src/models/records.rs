//! Flat record types for every resume section, each paired with a typed patch.
//!
//! A patch carries `Option<_>` per field; applying it overwrites only the
//! fields that were supplied. Patches reject unknown JSON keys so a typo in a
//! form field name surfaces as a 400 instead of silently doing nothing.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::models::resume::{Resume, Section, SectionKind};

/// A record stored in one of the draft's ordered collections.
pub trait SectionRecord:
    Clone + Default + Serialize + DeserializeOwned + Send + Sync + 'static
{
    type Patch: RecordPatch<Record = Self> + DeserializeOwned;

    const SECTION: SectionKind;

    fn section(resume: &Resume) -> &Section<Self>;

    fn section_mut(resume: &mut Resume) -> &mut Section<Self>;
}

/// Partial update for a record. Links a patch type back to its record so
/// `ResumeStore::update` can infer the section from the patch alone.
pub trait RecordPatch: Sized {
    type Record;

    fn apply(self, target: &mut Self::Record);
}

macro_rules! resume_record {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$fmeta:meta])* $field:ident : $ty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(default, rename_all = "camelCase")]
        pub struct $name {
            $( $(#[$fmeta])* pub $field: $ty, )*
        }
    };

    (
        $(#[$meta:meta])*
        $name:ident, $patch:ident {
            $( $(#[$fmeta:meta])* $field:ident : $ty:ty ),* $(,)?
        }
    ) => {
        resume_record! {
            $(#[$meta])*
            $name {
                $( $(#[$fmeta])* $field: $ty, )*
            }
        }

        #[doc = concat!("Partial update for [`", stringify!($name), "`].")]
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(default, rename_all = "camelCase", deny_unknown_fields)]
        pub struct $patch {
            $(
                #[serde(skip_serializing_if = "Option::is_none")]
                pub $field: Option<$ty>,
            )*
        }

        impl RecordPatch for $patch {
            type Record = $name;

            fn apply(self, target: &mut $name) {
                $(
                    if let Some(value) = self.$field {
                        target.$field = value;
                    }
                )*
            }
        }
    };

    (
        $(#[$meta:meta])*
        $name:ident, $patch:ident in $kind:ident => $collection:ident {
            $( $(#[$fmeta:meta])* $field:ident : $ty:ty ),* $(,)?
        }
    ) => {
        resume_record! {
            $(#[$meta])*
            $name, $patch {
                $( $(#[$fmeta])* $field: $ty, )*
            }
        }

        impl SectionRecord for $name {
            type Patch = $patch;

            const SECTION: SectionKind = SectionKind::$kind;

            fn section(resume: &Resume) -> &Section<Self> {
                &resume.$collection
            }

            fn section_mut(resume: &mut Resume) -> &mut Section<Self> {
                &mut resume.$collection
            }
        }
    };
}

// ────────────────────────────────────────────────────────────────────────────
// Basics
// ────────────────────────────────────────────────────────────────────────────

resume_record! {
    /// A social or professional profile link.
    Profile {
        network: String,
        username: String,
        url: String,
    }
}

resume_record! {
    Location {
        address: String,
        postal_code: String,
        city: String,
        /// ISO-3166-1 alpha-2 code, e.g. `US`.
        country_code: String,
        region: String,
    }
}

resume_record! {
    /// The singleton header of a resume.
    ///
    /// `location` and `profiles` merge shallowly: a patch that supplies them
    /// replaces the whole value.
    Basics, BasicsPatch {
        name: String,
        label: String,
        image: String,
        email: String,
        phone: String,
        url: String,
        summary: String,
        location: Location,
        profiles: Vec<Profile>,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Collections
// ────────────────────────────────────────────────────────────────────────────

resume_record! {
    WorkExperience, WorkExperiencePatch in Work => work {
        /// Company name.
        name: String,
        position: String,
        url: String,
        start_date: String,
        end_date: String,
        summary: String,
        highlights: Vec<String>,
    }
}

resume_record! {
    Volunteer, VolunteerPatch in Volunteer => volunteer {
        organization: String,
        position: String,
        url: String,
        start_date: String,
        end_date: String,
        summary: String,
        highlights: Vec<String>,
    }
}

resume_record! {
    Education, EducationPatch in Education => education {
        institution: String,
        url: String,
        area: String,
        study_type: String,
        start_date: String,
        end_date: String,
        score: String,
        courses: Vec<String>,
    }
}

resume_record! {
    Award, AwardPatch in Awards => awards {
        title: String,
        date: String,
        awarder: String,
        summary: String,
    }
}

resume_record! {
    Certificate, CertificatePatch in Certificates => certificates {
        name: String,
        date: String,
        issuer: String,
        url: String,
    }
}

resume_record! {
    Publication, PublicationPatch in Publications => publications {
        name: String,
        publisher: String,
        release_date: String,
        url: String,
        summary: String,
    }
}

resume_record! {
    Skill, SkillPatch in Skills => skills {
        name: String,
        level: String,
        keywords: Vec<String>,
    }
}

resume_record! {
    Language, LanguagePatch in Languages => languages {
        language: String,
        fluency: String,
    }
}

resume_record! {
    Interest, InterestPatch in Interests => interests {
        name: String,
        keywords: Vec<String>,
    }
}

resume_record! {
    Reference, ReferencePatch in References => references {
        name: String,
        reference: String,
    }
}

resume_record! {
    Project, ProjectPatch in Projects => projects {
        name: String,
        start_date: String,
        end_date: String,
        description: String,
        highlights: Vec<String>,
        url: String,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_fields_default_to_empty() {
        let work: WorkExperience = serde_json::from_value(json!({ "name": "Acme" })).unwrap();
        assert_eq!(work.name, "Acme");
        assert_eq!(work.position, "");
        assert!(work.highlights.is_empty());
    }

    #[test]
    fn test_fields_serialize_in_camel_case() {
        let education = Education {
            study_type: "Bachelor".to_string(),
            start_date: "2015-09".to_string(),
            ..Default::default()
        };
        let value = serde_json::to_value(&education).unwrap();
        assert_eq!(value["studyType"], "Bachelor");
        assert_eq!(value["startDate"], "2015-09");
        // Every key is written, even empty ones.
        assert_eq!(value["score"], "");
        assert_eq!(value["courses"], json!([]));
    }

    #[test]
    fn test_patch_applies_only_supplied_fields() {
        let mut skill = Skill {
            name: "Go".to_string(),
            level: "Advanced".to_string(),
            keywords: vec!["concurrency".to_string()],
        };
        SkillPatch {
            level: Some("Expert".to_string()),
            ..Default::default()
        }
        .apply(&mut skill);

        assert_eq!(skill.name, "Go");
        assert_eq!(skill.level, "Expert");
        assert_eq!(skill.keywords, vec!["concurrency".to_string()]);
    }

    #[test]
    fn test_patch_can_clear_a_field() {
        let mut award = Award {
            title: "Best Paper".to_string(),
            summary: "For work on caching".to_string(),
            ..Default::default()
        };
        let patch: AwardPatch = serde_json::from_value(json!({ "summary": "" })).unwrap();
        patch.apply(&mut award);
        assert_eq!(award.title, "Best Paper");
        assert_eq!(award.summary, "");
    }

    #[test]
    fn test_patch_rejects_unknown_fields() {
        let result: Result<LanguagePatch, _> =
            serde_json::from_value(json!({ "language": "French", "fluent": "yes" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_patch_changes_nothing() {
        let mut project = Project {
            name: "Engine".to_string(),
            url: "https://example.com".to_string(),
            ..Default::default()
        };
        let before = project.clone();
        ProjectPatch::default().apply(&mut project);
        assert_eq!(project, before);
    }

    #[test]
    fn test_basics_patch_replaces_location_wholesale() {
        let mut basics = Basics {
            name: "Ada".to_string(),
            location: Location {
                city: "London".to_string(),
                country_code: "GB".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        BasicsPatch {
            location: Some(Location {
                city: "Paris".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }
        .apply(&mut basics);

        assert_eq!(basics.name, "Ada");
        assert_eq!(basics.location.city, "Paris");
        assert_eq!(basics.location.country_code, "");
    }

    #[test]
    fn test_section_records_map_to_their_collections() {
        assert_eq!(WorkExperience::SECTION, SectionKind::Work);
        assert_eq!(Skill::SECTION, SectionKind::Skills);
        assert_eq!(Reference::SECTION, SectionKind::References);

        let mut resume = Resume::new();
        Skill::section_mut(&mut resume).push(Skill::default());
        assert_eq!(Skill::section(&resume).len(), 1);
        assert_eq!(resume.work.len(), 0);
    }
}
