pub mod timing;

pub use timing::{observe, LifecycleObserver, TelemetryInterceptor, RESPONSE_TIME_HEADER};
