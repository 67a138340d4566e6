mod common;
mod offer;
mod routing;
mod service;
