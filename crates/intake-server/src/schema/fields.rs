//! The questionnaire field table

use super::{FieldDef, FieldKind};

const fn text(name: &'static str, column: &'static str) -> FieldDef {
    FieldDef {
        name,
        column,
        kind: FieldKind::Text,
        bounds: None,
    }
}

const fn integer(name: &'static str, column: &'static str, min: i64, max: i64) -> FieldDef {
    FieldDef {
        name,
        column,
        kind: FieldKind::Integer,
        bounds: Some((min, max)),
    }
}

const fn boolean(name: &'static str, column: &'static str) -> FieldDef {
    FieldDef {
        name,
        column,
        kind: FieldKind::Boolean,
        bounds: None,
    }
}

const fn date(name: &'static str, column: &'static str) -> FieldDef {
    FieldDef {
        name,
        column,
        kind: FieldKind::Date,
        bounds: None,
    }
}

/// Every field a questionnaire can hold, in form order.
pub static FIELDS: &[FieldDef] = &[
    // Identity
    text("firstName", "first_name"),
    text("lastName", "last_name"),
    text("gender", "gender"),
    text("nationality", "nationality"),
    text("placeOfBirth", "place_of_birth"),
    date("dateOfBirth", "date_of_birth"),
    integer("age", "age", 15, 99),
    text("city", "city"),
    text("country", "country"),
    text("height", "height"),
    text("weight", "weight"),
    // Family background
    text("fatherName", "father_name"),
    text("fatherJob", "father_job"),
    text("motherName", "mother_name"),
    text("motherJob", "mother_job"),
    integer("numberOfSiblings", "number_of_siblings", 0, 30),
    text("siblingDetails", "sibling_details"),
    text("livingSituation", "living_situation"),
    text("parentalSupport", "parental_support"),
    text("familyFriendsInGermany", "family_friends_in_germany"),
    text("travelExperience", "travel_experience"),
    text("maritalStatus", "marital_status"),
    boolean("hasChildren", "has_children"),
    // Health and lifestyle
    text("allergies", "allergies"),
    text("smokingStatus", "smoking_status"),
    text("medicalConditions", "medical_conditions"),
    text("religion", "religion"),
    text("religiousImportance", "religious_importance"),
    text("meatConsumption", "meat_consumption"),
    text("fishConsumption", "fish_consumption"),
    text("alcoholConsumption", "alcohol_consumption"),
    text("dietaryRestrictions", "dietary_restrictions"),
    // Education and work
    text("schoolHistory", "school_history"),
    text("universityDetails", "university_details"),
    text("currentEmployment", "current_employment"),
    // Personality
    text("selfDescription", "self_description"),
    text("organizationalSkills", "organizational_skills"),
    text("punctuality", "punctuality"),
    text("communicationStyle", "communication_style"),
    text("socialPreferences", "social_preferences"),
    text("creativity", "creativity"),
    text("patience", "patience"),
    // Language skill levels
    text("germanProficiency", "german_proficiency"),
    text("englishProficiency", "english_proficiency"),
    text("otherLanguages", "other_languages"),
    // Hobbies
    text("sports", "sports"),
    text("instruments", "instruments"),
    text("recreationalActivities", "recreational_activities"),
    boolean("driversLicense", "drivers_license"),
    text("vehicleExperience", "vehicle_experience"),
    // Pets
    text("petComfort", "pet_comfort"),
    text("petOwnership", "pet_ownership"),
    text("petCareWillingness", "pet_care_willingness"),
    // Childcare and household experience
    text("ageGroupExperience", "age_group_experience"),
    text("childcareSkills", "childcare_skills"),
    text("handicappedChildrenExperience", "handicapped_children_experience"),
    text("cookingAbilities", "cooking_abilities"),
    text("cleaningSkills", "cleaning_skills"),
    text("laundryManagement", "laundry_management"),
    text("gardening", "gardening"),
    text("groceryShopping", "grocery_shopping"),
    // Placement preferences
    text("singleParentWillingness", "single_parent_willingness"),
    text("cityVillagePreference", "city_village_preference"),
    text("familyInteraction", "family_interaction"),
    // Travel and availability
    date("embassyAppointment", "embassy_appointment"),
    date("earliestStartDate", "earliest_start_date"),
    text("plannedDuration", "planned_duration"),
    text("tripFunding", "trip_funding"),
    // Motivation
    text("motivationalLetter", "motivational_letter"),
    text("photos", "photos"),
];
