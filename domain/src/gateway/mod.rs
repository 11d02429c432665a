pub mod autopay;
