//! Backend collections and generic CRUD over them.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use tracing::instrument;

use farmhand_core::Result;
use farmhand_core::error::InvalidInputError;

use crate::request::ApiRequest;
use crate::transport::AuthTransport;

/// A REST collection exposed by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Users,
    Farmers,
    Farms,
    Devices,
    Batches,
    ActivitySchedules,
    BreedTypes,
    Breeds,
    ActivityTypes,
    BreedActivities,
    ConditionTypes,
    BreedConditions,
    FoodTypes,
    BreedFeedings,
    BreedGrowths,
    PatientHealths,
    Recommendations,
    ExceptionDiseases,
    Anomalies,
    Medications,
    SensorTypes,
    Readings,
    SubscriptionTypes,
    FarmerSubscriptions,
    SubscriptionResources,
}

impl Resource {
    pub const ALL: [Resource; 25] = [
        Resource::Users,
        Resource::Farmers,
        Resource::Farms,
        Resource::Devices,
        Resource::Batches,
        Resource::ActivitySchedules,
        Resource::BreedTypes,
        Resource::Breeds,
        Resource::ActivityTypes,
        Resource::BreedActivities,
        Resource::ConditionTypes,
        Resource::BreedConditions,
        Resource::FoodTypes,
        Resource::BreedFeedings,
        Resource::BreedGrowths,
        Resource::PatientHealths,
        Resource::Recommendations,
        Resource::ExceptionDiseases,
        Resource::Anomalies,
        Resource::Medications,
        Resource::SensorTypes,
        Resource::Readings,
        Resource::SubscriptionTypes,
        Resource::FarmerSubscriptions,
        Resource::SubscriptionResources,
    ];

    /// Collection path relative to the API base, with a trailing slash.
    pub fn path(self) -> &'static str {
        match self {
            Resource::Users => "accounts/users/",
            Resource::Farmers => "accounts/farmers/",
            Resource::Farms => "farms/farms/",
            Resource::Devices => "farms/devices/",
            Resource::Batches => "batches/batches/",
            Resource::ActivitySchedules => "batches/activity-schedules/",
            Resource::BreedTypes => "breeds/breed-types/",
            Resource::Breeds => "breeds/breeds/",
            Resource::ActivityTypes => "breeds/activity-types/",
            Resource::BreedActivities => "breeds/breed-activities/",
            Resource::ConditionTypes => "breeds/condition-types/",
            Resource::BreedConditions => "breeds/breed-conditions/",
            Resource::FoodTypes => "breeds/food-types/",
            Resource::BreedFeedings => "breeds/breed-feedings/",
            Resource::BreedGrowths => "breeds/breed-growths/",
            Resource::PatientHealths => "knowledge/patient-healths/",
            Resource::Recommendations => "knowledge/recommendations/",
            Resource::ExceptionDiseases => "knowledge/exception-diseases/",
            Resource::Anomalies => "knowledge/anomalies/",
            Resource::Medications => "knowledge/medications/",
            Resource::SensorTypes => "sensors/sensor-types/",
            Resource::Readings => "sensors/readings/",
            Resource::SubscriptionTypes => "subscriptions/subscription-types/",
            Resource::FarmerSubscriptions => "subscriptions/farmer-subscriptions/",
            Resource::SubscriptionResources => "subscriptions/resources/",
        }
    }

    /// Short name used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Resource::Users => "users",
            Resource::Farmers => "farmers",
            Resource::Farms => "farms",
            Resource::Devices => "devices",
            Resource::Batches => "batches",
            Resource::ActivitySchedules => "activity-schedules",
            Resource::BreedTypes => "breed-types",
            Resource::Breeds => "breeds",
            Resource::ActivityTypes => "activity-types",
            Resource::BreedActivities => "breed-activities",
            Resource::ConditionTypes => "condition-types",
            Resource::BreedConditions => "breed-conditions",
            Resource::FoodTypes => "food-types",
            Resource::BreedFeedings => "breed-feedings",
            Resource::BreedGrowths => "breed-growths",
            Resource::PatientHealths => "patient-healths",
            Resource::Recommendations => "recommendations",
            Resource::ExceptionDiseases => "exception-diseases",
            Resource::Anomalies => "anomalies",
            Resource::Medications => "medications",
            Resource::SensorTypes => "sensor-types",
            Resource::Readings => "readings",
            Resource::SubscriptionTypes => "subscription-types",
            Resource::FarmerSubscriptions => "farmer-subscriptions",
            Resource::SubscriptionResources => "resources",
        }
    }

    fn item_path(self, id: &str) -> String {
        format!("{}{}/", self.path(), id.trim_matches('/'))
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Resource {
    type Err = InvalidInputError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Resource::ALL
            .into_iter()
            .find(|r| r.name() == s)
            .ok_or_else(|| InvalidInputError::Resource {
                value: s.to_string(),
            })
    }
}

/// CRUD calls on one collection, sent through the authenticated transport.
#[derive(Debug, Clone)]
pub struct ResourceClient {
    transport: AuthTransport,
    resource: Resource,
}

impl ResourceClient {
    pub fn new(transport: AuthTransport, resource: Resource) -> Self {
        Self {
            transport,
            resource,
        }
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }

    /// List the collection, passing `params` as query parameters.
    ///
    /// The payload is returned as sent by the backend, either a
    /// `{count, results}` page or a bare array.
    #[instrument(skip(self, params), fields(resource = %self.resource))]
    pub async fn list(&self, params: &[(String, String)]) -> Result<Value> {
        let request = ApiRequest::get(self.resource.path())
            .query_all(params.iter().map(|(k, v)| (k.as_str(), v)));
        self.transport.send_value(&request).await
    }

    #[instrument(skip(self), fields(resource = %self.resource))]
    pub async fn retrieve(&self, id: &str) -> Result<Value> {
        let request = ApiRequest::get(self.resource.item_path(id));
        self.transport.send_value(&request).await
    }

    #[instrument(skip(self, body), fields(resource = %self.resource))]
    pub async fn create(&self, body: &Value) -> Result<Value> {
        let request = ApiRequest::post(self.resource.path()).body(body.clone());
        self.transport.send_value(&request).await
    }

    /// Partially update one item.
    #[instrument(skip(self, body), fields(resource = %self.resource))]
    pub async fn update(&self, id: &str, body: &Value) -> Result<Value> {
        let request = ApiRequest::patch(self.resource.item_path(id)).body(body.clone());
        self.transport.send_value(&request).await
    }

    #[instrument(skip(self), fields(resource = %self.resource))]
    pub async fn delete(&self, id: &str) -> Result<()> {
        let request = ApiRequest::delete(self.resource.item_path(id));
        self.transport.send(&request).await.map(|_| ())
    }
}
