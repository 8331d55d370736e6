use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use wayfarer_cache::CacheManager;

use super::conditions::map_condition;
use super::forecast::aggregate_forecast;
use super::{WeatherLocation, WeatherProvider};
use crate::clock::{Clock, SystemClock};
use crate::models::{CurrentWeather, Weather};
use crate::store::{Store, WeatherCacheRepository};
use crate::{Error, Result};

const CACHE_KEY: &str = "weather:current";

/// Where a returned snapshot came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherSource {
    Fresh,
    Cached,
}

/// Why a remote fetch did not produce fresh data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// Missing or rejected API key; the user has to fix configuration
    Auth(String),
    Network(String),
}

impl FetchFailure {
    fn classify(err: &Error) -> Self {
        match err {
            Error::AuthError(message) => FetchFailure::Auth(message.clone()),
            other => FetchFailure::Network(other.to_string()),
        }
    }

    /// Text suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            FetchFailure::Auth(_) => {
                "Weather is unavailable: the weather API key is missing or invalid. \
                 Set `weather.api_key` in the config file or WAYFARER_WEATHER_API_KEY."
                    .to_string()
            }
            FetchFailure::Network(_) => {
                "Could not reach the weather service; showing the last saved forecast.".to_string()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherOutcome {
    /// `None` only when nothing was ever cached and the fetch failed
    pub weather: Option<Weather>,
    pub source: WeatherSource,
    pub failure: Option<FetchFailure>,
}

/// Fetch-or-reuse weather with an hourly freshness window
///
/// Successful fetches are written to the key-value tier first and the
/// durable row second; reads prefer the key-value tier. Each write is a
/// single statement, so whichever tier a reader lands on holds a whole
/// snapshot.
pub struct WeatherService {
    provider: Box<dyn WeatherProvider>,
    location: WeatherLocation,
    kv: Arc<CacheManager>,
    durable: WeatherCacheRepository,
    clock: Arc<dyn Clock>,
    max_age: Duration,
    refreshing: AtomicBool,
}

impl WeatherService {
    pub fn new(
        provider: Box<dyn WeatherProvider>,
        location: WeatherLocation,
        kv: Arc<CacheManager>,
        store: &Store,
    ) -> Self {
        Self {
            provider,
            location,
            kv,
            durable: store.weather_cache(),
            clock: Arc::new(SystemClock),
            max_age: Duration::hours(1),
            refreshing: AtomicBool::new(false),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn location(&self) -> &WeatherLocation {
        &self.location
    }

    /// Most recent cached snapshot from either tier
    pub fn cached(&self) -> Result<Option<Weather>> {
        match self.kv.get::<Weather>(CACHE_KEY) {
            Ok(Some(entry)) => return Ok(Some(entry.value)),
            Ok(None) => {}
            Err(e) => warn!("Weather key-value tier unreadable, using durable copy: {}", e),
        }

        let durable = self.durable.get()?;
        if let Some(weather) = &durable {
            debug!("Weather served from durable row");
            if let Err(e) = self.kv.set(CACHE_KEY, weather, weather.last_updated) {
                warn!("Could not repopulate weather key-value tier: {}", e);
            }
        }

        Ok(durable)
    }

    /// When the last successful fetch happened
    pub fn last_fetch(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.cached()?.map(|weather| weather.last_updated))
    }

    /// True with no prior fetch, or once an hour or more has passed since it
    pub fn should_update(&self) -> Result<bool> {
        Ok(match self.last_fetch()? {
            None => true,
            Some(last) => self.clock.now() - last >= self.max_age,
        })
    }

    /// Cached data while fresh, otherwise a fetch with fallback to cache.
    /// `force` skips the freshness check.
    pub async fn get_weather(&self, force: bool) -> Result<WeatherOutcome> {
        if !force && !self.should_update()? {
            if let Some(weather) = self.cached()? {
                debug!("Weather cache is fresh");
                return Ok(WeatherOutcome {
                    weather: Some(weather),
                    source: WeatherSource::Cached,
                    failure: None,
                });
            }
        }

        self.refresh().await
    }

    /// Fetch now. A refresh already in flight is not interrupted: the
    /// caller gets the cached snapshot instead of a second request.
    pub async fn refresh(&self) -> Result<WeatherOutcome> {
        let Some(_guard) = RefreshGuard::acquire(&self.refreshing) else {
            debug!("Weather refresh already in flight; returning cached data");
            return Ok(WeatherOutcome {
                weather: self.cached()?,
                source: WeatherSource::Cached,
                failure: None,
            });
        };

        info!("Fetching weather for {}", self.location.name);
        match self.fetch().await {
            Ok(weather) => {
                self.persist(&weather)?;
                info!(
                    "Weather updated: {} days of forecast for {}",
                    weather.forecast.len(),
                    weather.location
                );
                Ok(WeatherOutcome {
                    weather: Some(weather),
                    source: WeatherSource::Fresh,
                    failure: None,
                })
            }
            Err(e) => {
                let failure = FetchFailure::classify(&e);
                warn!("Weather fetch failed, falling back to cache: {}", e);
                Ok(WeatherOutcome {
                    weather: self.cached()?,
                    source: WeatherSource::Cached,
                    failure: Some(failure),
                })
            }
        }
    }

    async fn fetch(&self) -> Result<Weather> {
        let (current, forecast) = futures::future::try_join(
            self.provider.current(&self.location),
            self.provider.forecast(&self.location),
        )
        .await?;

        Ok(Weather {
            location: self.location.name.clone(),
            current: CurrentWeather {
                temperature: current.temperature,
                condition: map_condition(current.condition_code, &current.icon),
                description: current.description,
                humidity: current.humidity,
                wind_speed: current.wind_speed,
                icon: current.icon,
            },
            forecast: aggregate_forecast(&forecast.samples, forecast.utc_offset_seconds),
            last_updated: self.clock.now(),
        })
    }

    fn persist(&self, weather: &Weather) -> Result<()> {
        if let Err(e) = self.kv.set(CACHE_KEY, weather, weather.last_updated) {
            warn!("Could not write weather key-value tier: {}", e);
            // Reads prefer this tier, so an older entry must not outlive the durable write
            if let Err(e) = self.kv.remove(CACHE_KEY) {
                warn!("Could not drop stale weather key-value entry: {}", e);
            }
        }
        self.durable.put(weather)
    }

    /// Refresh on a fixed interval while stale. The task stops when the
    /// returned handle is dropped.
    pub fn spawn_refresh(self: Arc<Self>, every: std::time::Duration) -> RefreshHandle {
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;

                match self.should_update() {
                    Ok(false) => continue,
                    Ok(true) => {}
                    Err(e) => {
                        warn!("Could not read weather cache state: {}", e);
                        continue;
                    }
                }

                if let Err(e) = self.refresh().await {
                    warn!("Scheduled weather refresh failed: {}", e);
                }
            }
        });

        RefreshHandle { task }
    }
}

/// Owns the scheduled refresh task
pub struct RefreshHandle {
    task: JoinHandle<()>,
}

impl RefreshHandle {
    pub fn stop(self) {
        self.task.abort();
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Clears the in-flight flag however the refresh ends
struct RefreshGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> RefreshGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::models::WeatherCondition;
    use crate::weather::{CurrentSample, ForecastReport, ForecastSample, MockWeatherProvider, Units};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::atomic::AtomicUsize;

    fn location() -> WeatherLocation {
        WeatherLocation {
            name: "Lisbon".to_string(),
            latitude: 38.7223,
            longitude: -9.1393,
            units: Units::Metric,
        }
    }

    fn current_sample() -> CurrentSample {
        CurrentSample {
            temperature: 21.5,
            humidity: 60,
            wind_speed: 3.2,
            condition_code: Some(801),
            description: "few clouds".to_string(),
            icon: "02d".to_string(),
        }
    }

    fn forecast_report(start: DateTime<Utc>) -> ForecastReport {
        let samples = (0..16)
            .map(|i| ForecastSample {
                timestamp: (start + Duration::hours(3 * i)).timestamp(),
                temperature: 15.0 + i as f64,
                condition_code: Some(800),
                description: "clear sky".to_string(),
                icon: "01d".to_string(),
                precipitation_probability: 0.0,
            })
            .collect();

        ForecastReport {
            samples,
            utc_offset_seconds: 0,
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn healthy_provider() -> MockWeatherProvider {
        let mut provider = MockWeatherProvider::new();
        provider.expect_current().returning(|_| Ok(current_sample()));
        provider
            .expect_forecast()
            .returning(|_| Ok(forecast_report(start())));
        provider
    }

    fn service(provider: MockWeatherProvider, clock: Arc<ManualClock>) -> (Store, WeatherService) {
        let store = Store::open_in_memory().unwrap();
        let kv = Arc::new(CacheManager::in_memory().unwrap());
        let service =
            WeatherService::new(Box::new(provider), location(), kv, &store).with_clock(clock);
        (store, service)
    }

    #[tokio::test]
    async fn test_should_update_without_prior_fetch() {
        let clock = Arc::new(ManualClock::new(start()));
        let (_store, service) = service(MockWeatherProvider::new(), clock);

        assert!(service.should_update().unwrap());
    }

    #[tokio::test]
    async fn test_freshness_window_is_one_hour() {
        let clock = Arc::new(ManualClock::new(start()));
        let (_store, service) = service(healthy_provider(), clock.clone());

        let outcome = service.refresh().await.unwrap();
        assert_eq!(outcome.source, WeatherSource::Fresh);
        assert!(!service.should_update().unwrap());

        clock.advance(Duration::minutes(59));
        assert!(!service.should_update().unwrap());

        clock.advance(Duration::minutes(1));
        assert!(service.should_update().unwrap());
    }

    #[tokio::test]
    async fn test_fresh_fetch_builds_snapshot() {
        let clock = Arc::new(ManualClock::new(start()));
        let (_store, service) = service(healthy_provider(), clock);

        let weather = service.get_weather(false).await.unwrap().weather.unwrap();
        assert_eq!(weather.location, "Lisbon");
        assert_eq!(weather.current.condition, WeatherCondition::PartlyCloudy);
        assert_eq!(weather.forecast.len(), 2);
        assert_eq!(weather.last_updated, start());
    }

    #[tokio::test]
    async fn test_fresh_cache_skips_the_provider() {
        let clock = Arc::new(ManualClock::new(start()));
        let mut provider = MockWeatherProvider::new();
        provider
            .expect_current()
            .times(1)
            .returning(|_| Ok(current_sample()));
        provider
            .expect_forecast()
            .times(1)
            .returning(|_| Ok(forecast_report(start())));
        let (_store, service) = service(provider, clock.clone());

        service.get_weather(false).await.unwrap();
        clock.advance(Duration::minutes(30));
        let outcome = service.get_weather(false).await.unwrap();

        assert_eq!(outcome.source, WeatherSource::Cached);
        assert!(outcome.weather.is_some());
    }

    #[tokio::test]
    async fn test_auth_failure_falls_back_to_cache() {
        let clock = Arc::new(ManualClock::new(start()));
        let (store, service) = service(healthy_provider(), clock.clone());
        let first = service.refresh().await.unwrap().weather.unwrap();

        let mut failing = MockWeatherProvider::new();
        failing
            .expect_current()
            .returning(|_| Err(Error::AuthError("401 from provider".into())));
        failing
            .expect_forecast()
            .returning(|_| Ok(forecast_report(start())));
        let kv = Arc::new(CacheManager::in_memory().unwrap());
        let service = WeatherService::new(Box::new(failing), location(), kv, &store)
            .with_clock(clock.clone());

        clock.advance(Duration::hours(2));
        let outcome = service.get_weather(false).await.unwrap();

        assert_eq!(outcome.source, WeatherSource::Cached);
        assert_eq!(outcome.weather, Some(first));
        assert!(matches!(outcome.failure, Some(FetchFailure::Auth(_))));
        assert!(outcome.failure.unwrap().user_message().contains("API key"));
    }

    #[tokio::test]
    async fn test_network_failure_without_cache_yields_nothing() {
        let clock = Arc::new(ManualClock::new(start()));
        let mut provider = MockWeatherProvider::new();
        provider
            .expect_current()
            .returning(|_| Err(Error::NetworkError("connection refused".into())));
        provider
            .expect_forecast()
            .returning(|_| Err(Error::NetworkError("connection refused".into())));
        let (_store, service) = service(provider, clock);

        let outcome = service.get_weather(true).await.unwrap();
        assert!(outcome.weather.is_none());
        assert!(matches!(outcome.failure, Some(FetchFailure::Network(_))));
        assert!(service.should_update().unwrap());
    }

    #[tokio::test]
    async fn test_durable_row_survives_lost_key_value_tier() {
        let clock = Arc::new(ManualClock::new(start()));
        let (store, service) = service(healthy_provider(), clock.clone());
        let fetched = service.refresh().await.unwrap().weather.unwrap();

        // A fresh key-value tier, as after losing the cache file
        let kv = Arc::new(CacheManager::in_memory().unwrap());
        let restarted = WeatherService::new(Box::new(MockWeatherProvider::new()), location(), kv, &store)
            .with_clock(clock);

        assert_eq!(restarted.cached().unwrap(), Some(fetched));
        assert!(!restarted.should_update().unwrap());
    }

    #[tokio::test]
    async fn test_failed_key_value_write_does_not_leave_stale_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let kv_path = dir.path().join("cache.db");
        let clock = Arc::new(ManualClock::new(start()));
        let store = Store::open_in_memory().unwrap();
        let kv = Arc::new(CacheManager::open(&kv_path).unwrap());
        let service = WeatherService::new(Box::new(healthy_provider()), location(), kv, &store)
            .with_clock(clock.clone());

        service.refresh().await.unwrap();

        // From here on the key-value tier rejects writes but still serves reads
        let conn = rusqlite::Connection::open(&kv_path).unwrap();
        conn.execute_batch(
            "CREATE TRIGGER reject_insert BEFORE INSERT ON kv_cache
                BEGIN SELECT RAISE(ABORT, 'read only'); END;
             CREATE TRIGGER reject_update BEFORE UPDATE ON kv_cache
                BEGIN SELECT RAISE(ABORT, 'read only'); END;",
        )
        .unwrap();

        clock.advance(Duration::hours(2));
        let outcome = service.refresh().await.unwrap();
        assert_eq!(outcome.source, WeatherSource::Fresh);

        let cached = service.cached().unwrap().unwrap();
        assert_eq!(cached.last_updated, start() + Duration::hours(2));
        assert!(!service.should_update().unwrap());
    }

    /// Holds every provider call open for `delay` before answering
    struct SlowProvider {
        inner: MockWeatherProvider,
        delay: std::time::Duration,
    }

    #[async_trait]
    impl WeatherProvider for SlowProvider {
        async fn current(&self, location: &WeatherLocation) -> Result<CurrentSample> {
            tokio::time::sleep(self.delay).await;
            self.inner.current(location).await
        }

        async fn forecast(&self, location: &WeatherLocation) -> Result<ForecastReport> {
            tokio::time::sleep(self.delay).await;
            self.inner.forecast(location).await
        }
    }

    /// Counts `current` calls so a running scheduler can be observed
    struct CountingProvider {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl WeatherProvider for CountingProvider {
        async fn current(&self, _location: &WeatherLocation) -> Result<CurrentSample> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(current_sample())
        }

        async fn forecast(&self, _location: &WeatherLocation) -> Result<ForecastReport> {
            Ok(forecast_report(start()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_refreshes_share_one_fetch() {
        let clock = Arc::new(ManualClock::new(start()));
        let mut inner = MockWeatherProvider::new();
        // One fetch to seed the cache, one for the overlapping pair
        inner
            .expect_current()
            .times(2)
            .returning(|_| Ok(current_sample()));
        inner
            .expect_forecast()
            .times(2)
            .returning(|_| Ok(forecast_report(start())));
        let provider = SlowProvider {
            inner,
            delay: std::time::Duration::from_secs(5),
        };
        let store = Store::open_in_memory().unwrap();
        let kv = Arc::new(CacheManager::in_memory().unwrap());
        let service = WeatherService::new(Box::new(provider), location(), kv, &store)
            .with_clock(clock.clone());

        let seeded = service.refresh().await.unwrap().weather.unwrap();
        clock.advance(Duration::hours(2));

        let (first, second) = tokio::join!(service.refresh(), service.refresh());
        let (first, second) = (first.unwrap(), second.unwrap());

        assert_eq!(first.source, WeatherSource::Fresh);
        assert_eq!(
            first.weather.unwrap().last_updated,
            start() + Duration::hours(2)
        );
        assert_eq!(second.source, WeatherSource::Cached);
        assert_eq!(second.weather, Some(seeded));
        assert_eq!(second.failure, None);

        // The flag is released once the in-flight refresh finishes
        assert_eq!(service.refresh().await.unwrap().source, WeatherSource::Fresh);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduled_refresh_runs_only_while_stale() {
        let clock = Arc::new(ManualClock::new(start()));
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = CountingProvider {
            calls: calls.clone(),
        };
        let store = Store::open_in_memory().unwrap();
        let kv = Arc::new(CacheManager::in_memory().unwrap());
        let service = Arc::new(
            WeatherService::new(Box::new(provider), location(), kv, &store)
                .with_clock(clock.clone()),
        );

        let handle = service.clone().spawn_refresh(std::time::Duration::from_secs(60));

        // First tick is immediate and nothing is cached yet
        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Ticks inside the freshness window leave the provider alone
        tokio::time::sleep(std::time::Duration::from_secs(120)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        clock.advance(Duration::hours(1));
        tokio::time::sleep(std::time::Duration::from_secs(60)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        handle.stop();
        clock.advance(Duration::hours(3));
        tokio::time::sleep(std::time::Duration::from_secs(600)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_refresh_handle_ends_schedule() {
        let clock = Arc::new(ManualClock::new(start()));
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = CountingProvider {
            calls: calls.clone(),
        };
        let store = Store::open_in_memory().unwrap();
        let kv = Arc::new(CacheManager::in_memory().unwrap());
        let service = Arc::new(
            WeatherService::new(Box::new(provider), location(), kv, &store)
                .with_clock(clock.clone()),
        );

        let handle = service.clone().spawn_refresh(std::time::Duration::from_secs(60));
        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        drop(handle);
        clock.advance(Duration::hours(3));
        tokio::time::sleep(std::time::Duration::from_secs(600)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        // The aborted task released its clone of the service
        assert_eq!(Arc::strong_count(&service), 1);
    }

    #[test]
    fn test_refresh_guard_is_exclusive() {
        let flag = AtomicBool::new(false);
        let first = RefreshGuard::acquire(&flag);
        assert!(first.is_some());
        assert!(RefreshGuard::acquire(&flag).is_none());

        drop(first);
        assert!(RefreshGuard::acquire(&flag).is_some());
    }
}
