mod checkout;
mod grid;
mod helpers;
mod mocks;
mod webhook;
