pub mod iran;
