mod area_and_liquid;
mod common;
mod concurrency;
mod height;
mod line_of_sight;
mod mutations;
