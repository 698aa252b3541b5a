mod common;

mod auth_client_test;
