mod award_record;
mod participant;
mod participant_name;

pub use award_record::AwardRecord;
pub use participant::Participant;
pub use participant_name::{MAX_NAME_LENGTH, ParticipantName};
