pub mod academic;
pub mod anamnesis;
pub mod diagnosis;
pub mod saved_case;
pub mod timeline;
pub mod token_count;
pub mod training;
