mod common;
mod notifications;
mod scoring;
