mod context;
mod kv;
#[cfg(unix)]
mod skeleton;
