// ---------------------------------------------------------------------------
// Owner flags
// ---------------------------------------------------------------------------

pub const OWNER_CREATED: u16 = 0b0000_0001;
pub const OWNER_ABANDONED: u16 = 0b0000_0010;
pub const OWNER_COLLAPSED: u16 = 0b0000_0100;

/// Building behaviours that own citizen units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildingKind {
    /// Zoned residential, commercial, industrial and office buildings.
    Private,
    CargoStation,
    Cemetery,
    Childcare,
    Depot,
    DisasterResponse,
    DoomsdayVault,
    EarthquakeSensor,
    Eldercare,
    FireStation,
    FirewatchTower,
    FishFarm,
    FishingHarbor,
    HadronCollider,
    HeatingPlant,
    HelicopterDepot,
    Hospital,
    IndustryBuilding,
    LandfillSite,
    Library,
    MainCampus,
    MainIndustry,
    MaintenanceDepot,
    Market,
    Monument,
    Park,
    ParkBuilding,
    ParkGate,
    PoliceStation,
    PostOffice,
    PowerPlant,
    RadioMast,
    Sauna,
    School,
    Shelter,
    SnowDump,
    SpaceElevator,
    SpaceRadar,
    TourBuilding,
    Warehouse,
    WaterCleaner,
    WaterFacility,
    WeatherRadar,
}

/// Vehicle behaviours that own citizen units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VehicleKind {
    Ambulance,
    AmbulanceCopter,
    Bicycle,
    Blimp,
    Bus,
    CableCar,
    DisasterResponseCopter,
    DisasterResponseVehicle,
    Ferry,
    FireTruck,
    Hearse,
    ParkMaintenance,
    PassengerCar,
    PassengerPlane,
    PassengerShip,
    PassengerTrain,
    PoliceCar,
    PoliceCopter,
    Taxi,
    Tram,
    Trolleybus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OwnerKind {
    Building(BuildingKind),
    Vehicle(VehicleKind),
}

/// Per-owner numbers the counting rules read.
///
/// Which field means what depends on the kind: `capacity` is the corpse,
/// patient, jail, shelter, student or passenger capacity, `crew` is the
/// paramedic, driver, officer, firefighter or worker count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CapacityParams {
    pub homes: u32,
    /// Workplaces per education level.
    pub workplaces: [u32; 4],
    /// Visit places per building level.
    pub visit_places: [u32; 3],
    pub capacity: u32,
    pub crew: u32,
}

impl CapacityParams {
    pub fn total_workplaces(&self) -> u32 {
        self.workplaces.iter().sum()
    }

    pub fn total_visit_places(&self) -> u32 {
        self.visit_places.iter().sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnerInfo {
    pub kind: OwnerKind,
    pub level: u8,
    pub params: CapacityParams,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Building {
    pub flags: u16,
    pub info: Option<OwnerInfo>,
    /// Head of the building's unit chain.
    pub citizen_units: u32,
}

impl Building {
    /// Created, standing, and of a known kind.
    pub fn is_valid(&self) -> bool {
        self.flags & OWNER_CREATED != 0
            && self.flags & (OWNER_ABANDONED | OWNER_COLLAPSED) == 0
            && self.info.is_some()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Vehicle {
    pub flags: u16,
    pub info: Option<OwnerInfo>,
    pub citizen_units: u32,
}

impl Vehicle {
    pub fn is_valid(&self) -> bool {
        self.flags & OWNER_CREATED != 0 && self.info.is_some()
    }
}
