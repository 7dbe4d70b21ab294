use super::{LiteralMatcher, Rewrite};
use crate::migration::CapacityPlan;

/// Host method whose per-frame chunk size is derived from the unit count.
pub const SIMULATION_STEP_METHOD: &str = "CitizenManager::SimulationStepImpl";

/// Hook the host's unit deserialiser calls instead of loading the literal
/// count, so it reads as many records as the save actually holds.
pub const DESERIALIZE_LEN_HOOK: &str = "MigrationContext::deserialize_len";

const DESERIALIZE_METHOD: &str = "CitizenManager::Data::Deserialize";

/// Host methods that load the original unit count as a literal.
const GAME_TARGETS: &[&str] = &[
    "CitizenManager::Awake",
    "CitizenManager::ReleaseUnits",
    "BuildingAI::EnsureCitizenUnits",
    "CampusBuildingAI::HandleDead2",
    "CemeteryAI::GetDebugString",
    "CemeteryAI::GetDeadCount",
    "CemeteryAI::ProduceGoods",
    "CemeteryAI::GetLocalizedStats",
    "ChildcareAI::GetDebugString",
    "ChildcareAI::ReleaseBuilding",
    "CommonBuildingAI::GetDebugString",
    "CommonBuildingAI::EmptyBuilding",
    "CommonBuildingAI::GetHomeBehaviour",
    "CommonBuildingAI::GetWorkBehaviour",
    "CommonBuildingAI::GetStudentBehaviour",
    "CommonBuildingAI::GetVisitBehaviour",
    "EldercareAI::ReleaseBuilding",
    "HospitalAI::GetDebugString",
    "HospitalAI::ReleaseBuilding",
    "HospitalAI::ProduceGoods",
    "HospitalAI::GetLocalizedStats",
    "IndustryBuildingAI::HandleDead2",
    "MuseumAI::HandleDead2",
    "ParkBuildingAI::CountVisitors",
    "ParkBuildingAI::HandleDead2",
    "PoliceStationAI::ProduceGoods",
    "PoliceStationAI::GetLocalizedStats",
    "ResidentialBuildingAI::GetAverageResidentRequirement",
    "ShelterAI::HandleWorkAndVisitPlaces",
    "ShelterAI::GetLocalizedStats",
    "TourBuildingAI::CountUsers",
    "Building::GetEmptyCitizenUnit",
    "Building::GetNotFullCitizenUnit",
    "Building::FindCitizenUnit",
    "BuildingManager::Data::AfterDeserialize",
    "ResidentAI::FinishSchoolOrWork",
    "ResidentAI::TryJoinVehicle",
    "TouristAI::TryJoinVehicle",
    "Citizen::GetContainingUnit",
    "Citizen::AddToUnits",
    "Citizen::RemoveFromUnits",
    "DisasterHelpers::RemovePeople",
    "DisasterHelpers::SavePeople",
    "EventAI::CountVisitors",
    "CityServiceWorldInfoPanel::UpdateWorkers",
    "IndustryWorldInfoPanel::UpdateWorkersAndTotalUpkeep",
    "WarehouseWorldInfoPanel::UpdateWorkers",
    "ZonedBuildingWorldInfoPanel::UpdateWorkers",
    "ZonedBuildingWorldInfoPanel::UpdateResidential",
    "MessageManager::GetRandomCitizenID",
    "AmbulanceAI::GetBufferStatus",
    "AmbulanceAI::ArriveAtTarget",
    "AmbulanceAI::CanLeave",
    "AmbulanceAI::ArriveAtSource",
    "AmbulanceCopterAI::GetPatientCitizen",
    "AmbulanceCopterAI::CanLeave",
    "BicycleAI::GetDriverInstance",
    "BusAI::TransportArriveAtTarget",
    "DisasterResponseCopterAI::CanLeave",
    "DisasterResponseVehicleAI::CanLeave",
    "FireTruckAI::CanLeave",
    "HearseAI::GetBufferStatus",
    "HearseAI::ReleaseVehicle",
    "HearseAI::CanLeave",
    "HearseAI::LoadDeadCitizens",
    "HearseAI::ArriveAtSource",
    "ParkMaintenanceVehicleAI::CanLeave",
    "PassengerCarAI::UnloadPassengers",
    "PassengerCarAI::GetDriverInstance",
    "PassengerCarAI::ParkVehicle",
    "PoliceCarAI::CountCriminals",
    "PoliceCarAI::ArrestCriminals",
    "PoliceCarAI::CanLeave",
    "PoliceCarAI::UnloadCriminals",
    "PoliceCopterAI::CountCriminals",
    "TaxiAI::GetPassengerInstance",
    "TaxiAI::UnloadPassengers",
    "TaxiAI::ParkVehicle",
    "TrolleybusAI::TransportArriveAtTarget",
    "VehicleAI::EnsureCitizenUnits",
    "VehicleAI::CanLeave",
    "Vehicle::GetNotFullCitizenUnit",
    "VehicleManager::Data::AfterDeserialize",
];

/// Methods in other plugins that copied the literal. Missing ones are
/// expected when the plugin is not installed.
const PLUGIN_TARGETS: &[&str] = &["TrafficManager::ParkVehiclePatch::Prefix"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchEntry {
    pub target: &'static str,
    pub matcher: LiteralMatcher,
    pub rewrite: Rewrite,
    /// A missing method is not worth a warning.
    pub optional: bool,
}

/// Every rewrite needed to run the host at the expanded capacity.
#[derive(Debug, Clone)]
pub struct CapacityPatchSet {
    entries: Vec<PatchEntry>,
    chunk: PatchEntry,
}

impl CapacityPatchSet {
    pub fn new(plan: &CapacityPlan) -> Self {
        let literal = LiteralMatcher(plan.original as i32);
        let expanded = Rewrite::Operand(plan.expanded as i32);

        let mut entries: Vec<PatchEntry> = GAME_TARGETS
            .iter()
            .map(|&target| PatchEntry {
                target,
                matcher: literal,
                rewrite: expanded.clone(),
                optional: false,
            })
            .collect();
        entries.push(PatchEntry {
            target: DESERIALIZE_METHOD,
            matcher: literal,
            rewrite: Rewrite::Call(DESERIALIZE_LEN_HOOK),
            optional: false,
        });
        entries.extend(PLUGIN_TARGETS.iter().map(|&target| PatchEntry {
            target,
            matcher: literal,
            rewrite: expanded.clone(),
            optional: true,
        }));

        let chunk = PatchEntry {
            target: SIMULATION_STEP_METHOD,
            matcher: LiteralMatcher(plan.original_chunk() as i32),
            rewrite: Rewrite::Operand(plan.expanded_chunk() as i32),
            optional: false,
        };

        Self { entries, chunk }
    }

    /// Literal rewrites applied whenever the expanded array is in use.
    pub fn entries(&self) -> &[PatchEntry] {
        &self.entries
    }

    /// The per-frame chunk rewrite, applied once storage is confirmed.
    pub fn chunk_entry(&self) -> &PatchEntry {
        &self.chunk
    }
}
