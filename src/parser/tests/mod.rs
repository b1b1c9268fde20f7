mod dml;
mod select;
