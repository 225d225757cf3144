mod catalog;
mod common;
mod routing;
