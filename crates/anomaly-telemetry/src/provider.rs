//! Telemetry providers and driver-channel lookup

use crate::session::{Channel, Session, SessionKey, SessionKind};
use crate::store::slug;
use crate::{Error, Result};
use anomaly_core::TimeSeries;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Source of telemetry sessions
///
/// Implementations report lookups that cannot be satisfied (unknown year or
/// event, unreachable backend) as `DataUnavailable`.
pub trait TelemetryProvider {
    /// Event names of a season, in calendar order
    fn event_names(&self, year: u16) -> Result<Vec<String>>;

    fn load_session(&self, year: u16, event: &str, kind: SessionKind) -> Result<Session>;
}

impl<P: TelemetryProvider + ?Sized> TelemetryProvider for &P {
    fn event_names(&self, year: u16) -> Result<Vec<String>> {
        (**self).event_names(year)
    }

    fn load_session(&self, year: u16, event: &str, kind: SessionKind) -> Result<Session> {
        (**self).load_session(year, event, kind)
    }
}

fn unavailable(context: impl std::fmt::Display, err: Error) -> Error {
    if err.is_data_unavailable() {
        err
    } else {
        Error::data_unavailable(format!("{context}: {err}"))
    }
}

/// Sorted driver codes of a session
pub fn driver_codes<P: TelemetryProvider + ?Sized>(
    provider: &P,
    year: u16,
    event: &str,
    kind: SessionKind,
) -> Result<Vec<String>> {
    let session = provider
        .load_session(year, event, kind)
        .map_err(|e| unavailable(format_args!("{year} {event} {kind}"), e))?;
    Ok(session.driver_codes())
}

/// One channel of a driver's fastest lap
///
/// Every failure to find the data (provider error, unknown event, no timed
/// lap for the driver) is reported as `DataUnavailable`; an empty channel is
/// `InvalidSelection`.
pub fn fetch_driver_channel<P: TelemetryProvider + ?Sized>(
    provider: &P,
    key: &SessionKey,
    channel: Channel,
) -> Result<TimeSeries> {
    let session = provider
        .load_session(key.year, &key.event, key.session)
        .map_err(|e| unavailable(key, e))?;
    let lap = session.fastest_lap(&key.driver).ok_or_else(|| {
        Error::data_unavailable(format!("no timed lap for driver {} in {key}", key.driver))
    })?;
    debug!(key = %key, lap = lap.lap_number, lap_time = ?lap.lap_time, "picked fastest lap");
    let series = lap.channel(channel)?;
    Ok(series.with_name(format!("{} {}", key.driver, channel)))
}

/// Provider reading sessions previously exported to a directory tree
///
/// Layout: `<root>/<year>/schedule.json` holds the event names as a JSON
/// array, `<root>/<year>/<event slug>/<kind code>.json` holds one session.
/// The slug keeps only ASCII letters and digits, so event names never
/// reach outside the year directory.
#[derive(Debug, Clone)]
pub struct DirectoryProvider {
    root: PathBuf,
}

impl DirectoryProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn schedule_path(&self, year: u16) -> PathBuf {
        self.root.join(year.to_string()).join("schedule.json")
    }

    fn session_path(&self, year: u16, event: &str, kind: SessionKind) -> PathBuf {
        self.root
            .join(year.to_string())
            .join(slug(event))
            .join(format!("{}.json", kind.code()))
    }

    fn open(path: &Path, what: impl std::fmt::Display) -> Result<BufReader<File>> {
        match File::open(path) {
            Ok(file) => Ok(BufReader::new(file)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(Error::data_unavailable(format!("no {what} at {}", path.display())))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Export a session into the tree, adding its event to the schedule
    pub fn save_session(&self, session: &Session) -> Result<PathBuf> {
        let path = self.session_path(session.year, &session.event, session.kind);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer(&mut writer, session)?;
        writer.flush()?;

        let mut events = match self.event_names(session.year) {
            Ok(events) => events,
            Err(e) if e.is_data_unavailable() => Vec::new(),
            Err(e) => return Err(e),
        };
        if !events.contains(&session.event) {
            events.push(session.event.clone());
            let mut writer = BufWriter::new(File::create(self.schedule_path(session.year))?);
            serde_json::to_writer(&mut writer, &events)?;
            writer.flush()?;
        }
        info!(path = %path.display(), laps = session.laps.len(), "exported session");
        Ok(path)
    }
}

impl TelemetryProvider for DirectoryProvider {
    fn event_names(&self, year: u16) -> Result<Vec<String>> {
        let reader = Self::open(&self.schedule_path(year), format_args!("schedule for {year}"))?;
        Ok(serde_json::from_reader(reader)?)
    }

    fn load_session(&self, year: u16, event: &str, kind: SessionKind) -> Result<Session> {
        let path = self.session_path(year, event, kind);
        let reader = Self::open(&path, format_args!("session {year} {event} {kind}"))?;
        let session: Session = serde_json::from_reader(reader)?;
        debug!(path = %path.display(), laps = session.laps.len(), "loaded session");
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::session;
    use anomaly_core::ErrorKind;

    #[test]
    fn test_directory_provider_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let provider = DirectoryProvider::new(dir.path());
        provider.save_session(&session()).unwrap();

        assert_eq!(provider.event_names(2023).unwrap(), vec!["Monaco Grand Prix"]);
        let loaded = provider
            .load_session(2023, "Monaco Grand Prix", SessionKind::Qualifying)
            .unwrap();
        assert_eq!(loaded, session());
        assert_eq!(
            driver_codes(&provider, 2023, "Monaco Grand Prix", SessionKind::Qualifying).unwrap(),
            vec!["ALO", "LEC", "VER"]
        );
    }

    #[test]
    fn test_fetch_driver_channel() {
        let dir = tempfile::tempdir().unwrap();
        let provider = DirectoryProvider::new(dir.path());
        provider.save_session(&session()).unwrap();

        let key = SessionKey::new(2023, "Monaco Grand Prix", SessionKind::Qualifying, "ver");
        let speed = fetch_driver_channel(&provider, &key, Channel::Speed).unwrap();
        assert_eq!(speed.name(), "VER Speed");
        assert_eq!(speed.len(), 5);

        let key = SessionKey::new(2023, "Monaco Grand Prix", SessionKind::Qualifying, "ALO");
        let err = fetch_driver_channel(&provider, &key, Channel::Speed).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataUnavailable);

        let key = SessionKey::new(2023, "Atlantis Grand Prix", SessionKind::Race, "VER");
        let err = fetch_driver_channel(&provider, &key, Channel::Speed).unwrap_err();
        assert!(err.is_data_unavailable());
        assert!(provider.event_names(1950).unwrap_err().is_data_unavailable());
    }

    #[test]
    fn test_event_names_stay_inside_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("data");
        let provider = DirectoryProvider::new(&root);
        let mut escaping = session();
        escaping.event = "../../outside".to_string();

        let path = provider.save_session(&escaping).unwrap();
        assert!(path.starts_with(root.join("2023")));
        assert_eq!(path, root.join("2023").join("______outside").join("Q.json"));
        assert!(!dir.path().join("outside").exists());

        let loaded = provider
            .load_session(2023, "../../outside", SessionKind::Qualifying)
            .unwrap();
        assert_eq!(loaded.event, "../../outside");
        assert!(provider
            .load_session(2023, "../..", SessionKind::Race)
            .unwrap_err()
            .is_data_unavailable());
    }

    #[test]
    fn test_corrupt_session_reported_as_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let provider = DirectoryProvider::new(dir.path());
        let path = dir.path().join("2023").join("Monza").join("R.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();

        let key = SessionKey::new(2023, "Monza", SessionKind::Race, "VER");
        let err = fetch_driver_channel(&provider, &key, Channel::Speed).unwrap_err();
        assert!(err.is_data_unavailable());
    }
}
