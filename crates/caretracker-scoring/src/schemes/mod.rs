pub mod ppbv;
