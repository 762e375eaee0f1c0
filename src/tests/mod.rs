mod handlers;
mod hints;
mod service;
