//! Archive store integration tests
