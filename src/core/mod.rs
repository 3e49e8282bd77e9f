pub mod compiler;
pub mod container;
pub mod emit;
pub mod filter;
pub mod fragment;
pub mod grammar;
pub mod pipeline;
pub mod project;
pub mod reader;
pub mod registry;
pub mod sampler;
