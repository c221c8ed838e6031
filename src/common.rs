pub use std::{
    cmp::Reverse,
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
    str::FromStr,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex, RwLock,
    },
};

pub use tokio::{
    sync::{watch, Notify, Semaphore},
    time::{sleep, sleep_until, Duration, Instant},
};

pub use log::{debug, error, info, warn};

pub use flexi_logger::{
    Age, Cleanup, Criterion, DeferredNow, Duplicate, FileSpec, Logger, Naming, Record,
};

pub use serde::{de::DeserializeOwned, Deserialize, Serialize};

pub use serde_json::{json, Value};

pub use dotenv::dotenv;

pub use anyhow::{anyhow, Result};

pub use derive_builder::Builder;
pub use derive_new::new;
pub use getset::Getters;

pub use futures::future::{join_all, BoxFuture};

pub use async_trait::async_trait;

pub use once_cell::sync::Lazy as once_lazy;

pub use chrono::{DateTime, Utc};

pub use regex::Regex;
