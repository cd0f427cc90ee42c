pub mod fbref;
