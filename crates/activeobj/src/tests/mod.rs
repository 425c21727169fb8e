mod lifecycle;
mod scheduler;
