pub mod wa901nd;
