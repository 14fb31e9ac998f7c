//! Archiver pipeline tests, split by stage.

mod indexing;
