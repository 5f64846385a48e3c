pub mod records;
pub mod resume;

pub use records::{
    Award, Basics, BasicsPatch, Certificate, Education, Interest, Language, Project, Publication,
    RecordPatch, Reference, SectionRecord, Skill, Volunteer, WorkExperience,
};
pub use resume::{ItemId, JsonResume, Resume, ResumeId, ResumePatch, SectionKind};
