// Core modules implementing addressing, wire shapes, decoding, and error modeling.
pub mod address;
pub mod error;
pub mod rows;
pub mod schema;
pub mod seqnum;
pub mod value;
pub mod wire;
