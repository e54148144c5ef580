pub mod header;
pub mod hint_bar;
pub mod station_menu;
pub mod waveform;
