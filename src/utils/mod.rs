pub mod aggregate;
pub mod charts;
pub mod columns;
pub mod data;
pub mod excel;
pub mod rankings;
