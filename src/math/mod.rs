//! Self-contained float32 math.
//!
//! The objective transforms must produce the same bits on every platform, so
//! the exponential and its helpers are implemented directly on the IEEE-754
//! single-precision layout instead of going through `f64` library calls.
//!
//! - [`float32`]: classification, `copysign`, `ldexp` and the reference `exp`
//! - [`ExpBackend`]: interchangeable exponential strategies used by the transforms

pub mod float32;

mod exp;

pub use exp::ExpBackend;
