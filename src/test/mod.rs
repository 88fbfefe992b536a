mod app;
mod fakes;
mod utils;
mod yahoo;
