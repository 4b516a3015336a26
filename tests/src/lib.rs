#![cfg(test)]

mod fusion;
mod support;
