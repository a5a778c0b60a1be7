use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use jiff::ToSpan;
use jiff::civil::{Date, DateTime};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use ts_rs::TS;

use caretracker_analysis::aggregate::ScoredDay;
use caretracker_analysis::workload::{
    ShouldVsIs, StaffingParams, daily_workload, monthly_workload, night_workload, should_vs_is,
};
use caretracker_core::dates::{days_between, same_quarter};
use caretracker_core::models::classification::{
    ClassificationKey, ClassificationResult, ClassificationUpdate, ClassificationView,
    DailyClassification,
};
use caretracker_core::models::patient::{LastClassification, Patient, PatientSummary};
use caretracker_core::models::question::CareServiceOption;
use caretracker_core::models::station::{Station, StationSummary};
use caretracker_core::models::stay::{PatientDayRecord, StayClass, VisitType};
use caretracker_core::models::workload::{MonthlyWorkload, Shift, StationWorkload};
use caretracker_scoring::CareScheme;
use caretracker_scoring::scoring::{ScoringContext, StayContext};
use caretracker_scoring::tree::group_questions;

use crate::error::StorageError;
use crate::locks::KeyedLocks;
use crate::state;

/// Days before today checked for missing classifications.
const MISSING_LOOKBACK_DAYS: i64 = 7;

/// Everything the store holds, in its persisted form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub stations: Vec<Station>,
    #[serde(default)]
    pub patients: Vec<Patient>,
    #[serde(default)]
    pub catalog: Vec<CareServiceOption>,
    #[serde(default)]
    pub day_records: Vec<PatientDayRecord>,
    #[serde(default)]
    pub classifications: Vec<DailyClassification>,
    #[serde(default)]
    pub workloads: Vec<StationWorkload>,
}

/// Patient names of a station grouped by length of stay.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VisitTypeGroups {
    pub stationary: Vec<String>,
    pub part_stationary: Vec<String>,
    pub acute: Vec<String>,
    pub undefined: Vec<String>,
}

/// Caregivers on one shift, as reported by the hospital.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CaregiverShift {
    pub station_id: i64,
    pub date: Date,
    pub shift: Shift,
    pub caregivers_total: f64,
}

#[derive(Default)]
struct Tables {
    stations: BTreeMap<i64, Station>,
    patients: BTreeMap<i64, Patient>,
    catalog: Vec<CareServiceOption>,
    day_records: BTreeMap<ClassificationKey, PatientDayRecord>,
    classifications: BTreeMap<ClassificationKey, DailyClassification>,
    workloads: BTreeMap<(i64, Date, Shift), StationWorkload>,
}

impl From<Snapshot> for Tables {
    fn from(s: Snapshot) -> Self {
        Self {
            stations: s.stations.into_iter().map(|x| (x.id, x)).collect(),
            patients: s.patients.into_iter().map(|x| (x.id, x)).collect(),
            catalog: s.catalog,
            day_records: s
                .day_records
                .into_iter()
                .map(|r| (record_key(&r), r))
                .collect(),
            classifications: s
                .classifications
                .into_iter()
                .map(|c| (c.key, c))
                .collect(),
            workloads: s
                .workloads
                .into_iter()
                .map(|w| ((w.station_id, w.date, w.shift), w))
                .collect(),
        }
    }
}

impl Tables {
    fn snapshot(&self) -> Snapshot {
        Snapshot {
            stations: self.stations.values().cloned().collect(),
            patients: self.patients.values().cloned().collect(),
            catalog: self.catalog.clone(),
            day_records: self.day_records.values().cloned().collect(),
            classifications: self.classifications.values().cloned().collect(),
            workloads: self.workloads.values().cloned().collect(),
        }
    }

    fn station(&self, id: i64) -> Result<&Station, StorageError> {
        self.stations.get(&id).ok_or_else(|| StorageError::NotFound {
            key: format!("station {id}"),
        })
    }

    fn patient(&self, id: i64) -> Result<&Patient, StorageError> {
        self.patients.get(&id).ok_or_else(|| StorageError::NotFound {
            key: format!("patient {id}"),
        })
    }

    fn ensure_known(&self, key: &ClassificationKey) -> Result<(), StorageError> {
        self.station(key.station_id)?;
        self.patient(key.patient_id)?;
        Ok(())
    }

    fn roster(&self) -> Vec<Station> {
        let mut stations: Vec<Station> = self.stations.values().cloned().collect();
        stations.sort_by(|a, b| a.name.cmp(&b.name));
        stations
    }

    fn records_on(&self, station_id: i64, date: Date) -> impl Iterator<Item = &PatientDayRecord> {
        self.day_records
            .values()
            .filter(move |r| r.station_id == station_id && r.date == date)
    }

    fn is_classified(&self, key: &ClassificationKey) -> bool {
        self.classifications
            .get(key)
            .is_some_and(|c| c.result.is_some())
    }

    /// Whether another day of the patient in the same quarter already
    /// carries the repeat-visit surcharge.
    fn quarter_entry_elsewhere(&self, key: &ClassificationKey) -> bool {
        self.day_records.values().any(|r| {
            r.patient_id == key.patient_id
                && r.uses_quarter_entry
                && same_quarter(r.date, key.date)
                && record_key(r) != *key
        })
    }

    fn scoring_context(
        &self,
        classification: &DailyClassification,
        record: Option<&PatientDayRecord>,
    ) -> (ScoringContext, bool) {
        let entry_elsewhere = self.quarter_entry_elsewhere(&classification.key);
        let stay = StayContext::from_record(record, classification.is_in_isolation, entry_elsewhere);
        let context = ScoringContext {
            indices: classification.indices,
            stay,
        };
        (context, entry_elsewhere)
    }

    fn view(&self, key: &ClassificationKey) -> ClassificationView {
        let classification = self.classifications.get(key);
        let record = self.day_records.get(key);
        let selected = classification
            .map(|c| c.selected.clone())
            .unwrap_or_default();

        ClassificationView {
            care_service_options: group_questions(&self.catalog, &selected),
            is_in_isolation: classification.is_some_and(|c| c.is_in_isolation),
            admission_date: record.map(|r| r.admitted_at.date()),
            discharge_date: record
                .filter(|r| r.discharged_at != DateTime::MAX)
                .map(|r| r.discharged_at.date()),
            indices: classification.map(|c| c.indices).unwrap_or_default(),
            result: classification.and_then(|c| c.result),
            version: classification.map_or(0, |c| c.version),
        }
    }

    /// Store a rescored classification and keep the day record's quarter
    /// entry and the station's workload in step with it.
    fn commit(
        &mut self,
        classification: DailyClassification,
        entry_elsewhere: bool,
        staffing: &StaffingParams,
    ) {
        let key = classification.key;
        if let Some(record) = self.day_records.get_mut(&key)
            && record.visit_type == VisitType::SemiStationary
            && record.is_repeating_visit
        {
            record.uses_quarter_entry = classification.result.is_some() && !entry_elsewhere;
        }
        self.classifications.insert(key, classification);
        self.recompute_workload(key.station_id, key.date, staffing);
    }

    fn recompute_workload(&mut self, station_id: i64, date: Date, staffing: &StaffingParams) {
        let Some(station) = self.stations.get(&station_id) else {
            return;
        };

        let minutes: Vec<u32> = self
            .classifications
            .values()
            .filter(|c| c.key.station_id == station_id && c.key.date == date)
            .filter_map(|c| c.result.map(|r| r.minutes))
            .collect();
        let overnight = self.records_on(station_id, date).filter(|r| r.night_stay()).count();
        let caregivers = |shift: Shift| {
            self.workloads
                .get(&(station_id, date, shift))
                .map_or(0.0, |w| w.caregivers_total)
        };

        let day = daily_workload(station_id, date, &minutes, caregivers(Shift::Day), staffing);
        let night = night_workload(
            station,
            date,
            u32::try_from(overnight).unwrap_or(u32::MAX),
            caregivers(Shift::Night),
        );
        tracing::debug!(
            station_id,
            %date,
            minutes_total = day.minutes_total,
            night_patients = night.patients_total,
            "workload recomputed"
        );
        self.workloads.insert((station_id, date, Shift::Day), day);
        self.workloads.insert((station_id, date, Shift::Night), night);
    }
}

fn record_key(r: &PatientDayRecord) -> ClassificationKey {
    ClassificationKey {
        station_id: r.station_id,
        patient_id: r.patient_id,
        date: r.date,
    }
}

fn key_label(key: &ClassificationKey) -> String {
    format!(
        "classification station={} patient={} date={}",
        key.station_id, key.patient_id, key.date
    )
}

/// The repository behind the API.
///
/// Mutations of one classification are serialized through a per-key lock.
/// Each mutation scores and commits under a single table write lock, so
/// cross-day bookkeeping like the quarter entry never sees a stale table.
pub struct Store {
    tables: RwLock<Tables>,
    locks: KeyedLocks<ClassificationKey>,
    scheme: Arc<dyn CareScheme>,
    staffing: StaffingParams,
    snapshot_path: Option<PathBuf>,
    persist: Mutex<()>,
}

impl Store {
    pub fn new(snapshot: Snapshot, scheme: Arc<dyn CareScheme>, staffing: StaffingParams) -> Self {
        Self {
            tables: RwLock::new(snapshot.into()),
            locks: KeyedLocks::new(),
            scheme,
            staffing,
            snapshot_path: None,
            persist: Mutex::new(()),
        }
    }

    /// Load the snapshot at `path`, or start empty if there is none yet.
    /// Every later mutation is written back to `path`.
    pub async fn open(
        path: &Path,
        scheme: Arc<dyn CareScheme>,
        staffing: StaffingParams,
    ) -> Result<Self, StorageError> {
        let snapshot = match state::load_state::<Snapshot>(path).await {
            Ok(snapshot) => {
                tracing::info!(
                    path = %path.display(),
                    stations = snapshot.stations.len(),
                    classifications = snapshot.classifications.len(),
                    "snapshot loaded"
                );
                snapshot
            }
            Err(StorageError::NotFound { .. }) => {
                tracing::info!(path = %path.display(), "no snapshot yet, starting empty");
                Snapshot::default()
            }
            Err(e) => return Err(e),
        };

        let mut store = Self::new(snapshot, scheme, staffing);
        store.snapshot_path = Some(path.to_path_buf());
        Ok(store)
    }

    pub fn scheme(&self) -> &dyn CareScheme {
        self.scheme.as_ref()
    }

    pub fn staffing(&self) -> &StaffingParams {
        &self.staffing
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.tables.read().await.snapshot()
    }

    async fn persist(&self) -> Result<(), StorageError> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };
        let _order = self.persist.lock().await;
        let snapshot = self.tables.read().await.snapshot();
        state::save_state(path, &snapshot).await.map_err(|e| {
            tracing::error!(
                path = %path.display(),
                error = %e,
                "change applied in memory but snapshot not written"
            );
            StorageError::NotPersisted {
                reason: e.to_string(),
            }
        })
    }

    // --- Stations and patients ---

    /// All stations, by name, with today's patient count and the number of
    /// patients still unclassified today.
    pub async fn stations(&self, today: Date) -> Vec<StationSummary> {
        let t = self.tables.read().await;
        t.roster()
            .into_iter()
            .map(|station| {
                let patients: BTreeSet<i64> = t
                    .records_on(station.id, today)
                    .map(|r| r.patient_id)
                    .collect();
                let missing = patients
                    .iter()
                    .filter(|&&patient_id| {
                        !t.is_classified(&ClassificationKey {
                            station_id: station.id,
                            patient_id,
                            date: today,
                        })
                    })
                    .count();
                StationSummary {
                    id: station.id,
                    name: station.name,
                    patient_count: count(patients.len()),
                    missing_classifications: count(missing),
                }
            })
            .collect()
    }

    pub async fn roster(&self) -> Vec<Station> {
        self.tables.read().await.roster()
    }

    /// Patients on the station today, with their latest classification.
    pub async fn patients(
        &self,
        station_id: i64,
        today: Date,
    ) -> Result<Vec<PatientSummary>, StorageError> {
        let t = self.tables.read().await;
        t.station(station_id)?;

        let lookback_start = today
            .checked_sub(MISSING_LOOKBACK_DAYS.days())
            .unwrap_or(today);
        let yesterday = today.checked_sub(1.day()).unwrap_or(today);

        let patient_ids: BTreeSet<i64> = t
            .records_on(station_id, today)
            .map(|r| r.patient_id)
            .collect();

        let summaries = patient_ids
            .into_iter()
            .filter_map(|patient_id| t.patients.get(&patient_id))
            .map(|patient| {
                let history: Vec<&DailyClassification> = t
                    .classifications
                    .values()
                    .filter(|c| {
                        c.key.station_id == station_id
                            && c.key.patient_id == patient.id
                            && c.key.date <= today
                    })
                    .collect();
                let latest = history.iter().max_by_key(|c| c.key.date);
                let last_classification = history
                    .iter()
                    .filter(|c| c.result.is_some())
                    .max_by_key(|c| c.key.date)
                    .and_then(|c| {
                        c.result.map(|r| LastClassification {
                            date: c.key.date,
                            a_index: r.category1,
                            s_index: r.category2,
                            minutes: r.minutes,
                        })
                    });

                let missing = if yesterday < today {
                    days_between(lookback_start, yesterday)
                        .filter(|&date| {
                            let key = ClassificationKey {
                                station_id,
                                patient_id: patient.id,
                                date,
                            };
                            t.day_records.contains_key(&key) && !t.is_classified(&key)
                        })
                        .collect()
                } else {
                    Vec::new()
                };

                PatientSummary {
                    id: patient.id,
                    name: patient.full_name(),
                    current_room: latest.and_then(|c| c.room_name.clone()),
                    current_bed: latest.and_then(|c| c.bed_number.clone()),
                    last_classification,
                    missing_classifications_last_week: missing,
                }
            })
            .collect();
        Ok(summaries)
    }

    /// Dates on which the patient was on the station and needs a classification.
    pub async fn patient_dates(
        &self,
        patient_id: i64,
        station_id: i64,
    ) -> Result<Vec<Date>, StorageError> {
        let t = self.tables.read().await;
        t.patient(patient_id)?;
        t.station(station_id)?;
        Ok(t.day_records
            .values()
            .filter(|r| r.patient_id == patient_id && r.station_id == station_id)
            .map(|r| r.date)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect())
    }

    /// Station of the patient's latest day record up to `today`.
    pub async fn current_station(&self, patient_id: i64, today: Date) -> Result<Station, StorageError> {
        let t = self.tables.read().await;
        t.patient(patient_id)?;
        t.day_records
            .values()
            .filter(|r| r.patient_id == patient_id && r.date <= today)
            .max_by_key(|r| r.date)
            .and_then(|r| t.stations.get(&r.station_id))
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                key: format!("current station of patient {patient_id}"),
            })
    }

    pub async fn visit_types(&self, station_id: i64, today: Date) -> Result<VisitTypeGroups, StorageError> {
        let t = self.tables.read().await;
        t.station(station_id)?;

        let mut groups = VisitTypeGroups::default();
        for record in t.records_on(station_id, today) {
            let Some(patient) = t.patients.get(&record.patient_id) else {
                continue;
            };
            let bucket = match record.stay_class() {
                StayClass::Stationary => &mut groups.stationary,
                StayClass::PartStationary => &mut groups.part_stationary,
                StayClass::Acute => &mut groups.acute,
                StayClass::Undefined => &mut groups.undefined,
            };
            bucket.push(patient.full_name());
        }
        Ok(groups)
    }

    // --- Classifications ---

    /// The question tree of a patient-day with its current selections. A
    /// day nobody touched yet shows an empty, unclassified tree.
    pub async fn classification(&self, key: &ClassificationKey) -> Result<ClassificationView, StorageError> {
        let t = self.tables.read().await;
        t.ensure_known(key)?;
        Ok(t.view(key))
    }

    /// The stored result of a patient-day.
    pub async fn classification_result(
        &self,
        key: &ClassificationKey,
    ) -> Result<LastClassification, StorageError> {
        let t = self.tables.read().await;
        t.ensure_known(key)?;
        let classification = t
            .classifications
            .get(key)
            .ok_or_else(|| StorageError::NotFound { key: key_label(key) })?;
        let result = classification
            .result
            .ok_or_else(|| StorageError::Unclassified { key: key_label(key) })?;
        Ok(LastClassification {
            date: key.date,
            a_index: result.category1,
            s_index: result.category2,
            minutes: result.minutes,
        })
    }

    /// Apply a partial update, rescore, and return the canonical state.
    pub async fn update_classification(
        &self,
        key: &ClassificationKey,
        update: &ClassificationUpdate,
    ) -> Result<ClassificationView, StorageError> {
        let _guard = self.locks.lock(key).await;

        let view = {
            let mut t = self.tables.write().await;
            t.ensure_known(key)?;

            let mut classification = t
                .classifications
                .get(key)
                .cloned()
                .unwrap_or_else(|| DailyClassification::new(*key));
            if let Some(expected) = update.expected_version
                && expected != classification.version
            {
                return Err(StorageError::VersionConflict {
                    expected,
                    actual: classification.version,
                });
            }

            classification.apply(update, |id| t.catalog.iter().any(|o| o.id == id))?;

            let (context, entry_elsewhere) = t.scoring_context(&classification, t.day_records.get(key));
            classification.result = self.rescore(&t, &classification, &context)?;

            tracing::info!(
                station_id = key.station_id,
                patient_id = key.patient_id,
                date = %key.date,
                version = classification.version,
                direct = classification.direct.is_some(),
                result = ?classification.result.map(|r| r.code()),
                "classification updated"
            );

            t.commit(classification, entry_elsewhere, &self.staffing);
            t.view(key)
        };
        self.persist().await?;
        Ok(view)
    }

    /// Rescore a stored classification the way it was last entered.
    pub async fn calculate(&self, key: &ClassificationKey) -> Result<ClassificationResult, StorageError> {
        let _guard = self.locks.lock(key).await;

        let result = {
            let mut t = self.tables.write().await;
            t.ensure_known(key)?;
            let mut classification = t
                .classifications
                .get(key)
                .cloned()
                .ok_or_else(|| StorageError::NotFound { key: key_label(key) })?;

            let (context, entry_elsewhere) = t.scoring_context(&classification, t.day_records.get(key));
            let result = self
                .rescore(&t, &classification, &context)?
                .ok_or_else(|| StorageError::Unclassified { key: key_label(key) })?;
            classification.result = Some(result);
            t.commit(classification, entry_elsewhere, &self.staffing);
            result
        };
        self.persist().await?;
        Ok(result)
    }

    /// Classify from an explicit category pair, bypassing the questions.
    /// The pair is kept, so later isolation changes rescore from it.
    pub async fn classify_direct(
        &self,
        key: &ClassificationKey,
        category1: u8,
        category2: u8,
    ) -> Result<ClassificationResult, StorageError> {
        let _guard = self.locks.lock(key).await;

        let result = {
            let mut t = self.tables.write().await;
            t.ensure_known(key)?;
            let mut classification = t
                .classifications
                .get(key)
                .cloned()
                .unwrap_or_else(|| DailyClassification::new(*key));

            let (context, entry_elsewhere) = t.scoring_context(&classification, t.day_records.get(key));
            let result = self.scheme.score_direct(category1, category2, &context)?;
            classification.direct = Some((category1, category2));
            classification.result = Some(result);
            classification.version += 1;

            tracing::info!(
                station_id = key.station_id,
                patient_id = key.patient_id,
                date = %key.date,
                code = %result.code(),
                "direct classification"
            );

            t.commit(classification, entry_elsewhere, &self.staffing);
            result
        };
        self.persist().await?;
        Ok(result)
    }

    /// Score through the direct pair when one was entered, else through the
    /// selected questions.
    fn rescore(
        &self,
        t: &Tables,
        classification: &DailyClassification,
        context: &ScoringContext,
    ) -> Result<Option<ClassificationResult>, StorageError> {
        if let Some((category1, category2)) = classification.direct {
            return Ok(Some(self.scheme.score_direct(category1, category2, context)?));
        }
        let fields = group_questions(&t.catalog, &classification.selected);
        Ok(self.scheme.score(&fields, context))
    }

    /// Minutes of every classified patient-day.
    pub async fn scored_days(&self) -> Vec<ScoredDay> {
        let t = self.tables.read().await;
        t.classifications
            .values()
            .filter_map(|c| {
                c.result.map(|r| ScoredDay {
                    station_id: c.key.station_id,
                    patient_id: c.key.patient_id,
                    date: c.key.date,
                    minutes: r.minutes,
                })
            })
            .collect()
    }

    // --- Imports ---

    /// Add the hospital's day records, creating patients seen for the first
    /// time. Returns how many patients were created.
    pub async fn import_day_records(
        &self,
        rows: Vec<(Patient, PatientDayRecord)>,
    ) -> Result<usize, StorageError> {
        let created = {
            let mut t = self.tables.write().await;
            let mut created = 0;
            let mut touched = BTreeSet::new();
            for (_, record) in &rows {
                t.station(record.station_id)?;
            }
            for (patient, record) in rows {
                if !t.patients.contains_key(&patient.id) {
                    t.patients.insert(patient.id, patient);
                    created += 1;
                }
                touched.insert((record.station_id, record.date));
                t.day_records.insert(record_key(&record), record);
            }
            for (station_id, date) in touched {
                t.recompute_workload(station_id, date, &self.staffing);
            }
            created
        };
        self.persist().await?;
        Ok(created)
    }

    /// Record how many caregivers worked the given shifts.
    pub async fn import_caregivers(&self, shifts: &[CaregiverShift]) -> Result<(), StorageError> {
        {
            let mut t = self.tables.write().await;
            for shift in shifts {
                t.station(shift.station_id)?;
            }
            for shift in shifts {
                let slot = (shift.station_id, shift.date, shift.shift);
                match t.workloads.get_mut(&slot) {
                    Some(w) => w.caregivers_total = shift.caregivers_total,
                    None => {
                        t.workloads.insert(
                            slot,
                            StationWorkload {
                                station_id: shift.station_id,
                                date: shift.date,
                                shift: shift.shift,
                                patients_total: 0,
                                caregivers_total: shift.caregivers_total,
                                minutes_total: 0,
                                suggested_caregivers: None,
                            },
                        );
                    }
                }
                t.recompute_workload(shift.station_id, shift.date, &self.staffing);
            }
        }
        self.persist().await
    }

    // --- Workload ---

    pub async fn workloads(&self) -> Vec<StationWorkload> {
        self.tables.read().await.workloads.values().cloned().collect()
    }

    /// Suggested versus actual caregivers, for one station or all of them.
    pub async fn should_vs_is(
        &self,
        station_id: Option<i64>,
        start: Date,
        end: Date,
    ) -> Result<Vec<ShouldVsIs>, StorageError> {
        let t = self.tables.read().await;
        let stations = match station_id {
            Some(id) => vec![t.station(id)?.clone()],
            None => t.roster(),
        };
        let workloads: Vec<StationWorkload> = t.workloads.values().cloned().collect();
        Ok(should_vs_is(&stations, &workloads, start, end, &self.staffing))
    }

    /// Day and night averages of every station for the month of `month`.
    pub async fn monthly_workloads(&self, month: Date) -> Vec<MonthlyWorkload> {
        let t = self.tables.read().await;
        let workloads: Vec<StationWorkload> = t.workloads.values().cloned().collect();
        t.roster()
            .iter()
            .flat_map(|station| {
                [Shift::Day, Shift::Night].map(|shift| {
                    monthly_workload(station.id, month, shift, &workloads, &self.staffing)
                })
            })
            .collect()
    }

    /// Keys currently locked for mutation.
    pub async fn active_mutations(&self) -> usize {
        self.locks.active().await
    }
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
