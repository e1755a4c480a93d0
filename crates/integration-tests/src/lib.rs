//! End-to-end tests for d2render live under `tests/`
