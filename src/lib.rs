pub mod args;
pub mod benchmark;
pub mod classifier;
pub mod html;
pub mod observation;
pub mod patterns;
pub mod stats;
pub mod survey;
pub mod tag;
pub mod utils;

pub use args::Args;
pub use classifier::{Classification, Classifier, ClassifierOptions, ImgGate};
pub use observation::{Category, Observation, PageResult};
pub use stats::{Aggregate, SurveyReport};
pub use survey::{print_survey_report, run_survey};
pub use tag::Tag;
