//! Repository implementations backed by real storage.

pub mod seaorm;
