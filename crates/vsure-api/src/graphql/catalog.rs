// The catalog of supported backend operations.
//
// Each entry is plain data. Adding an operation means adding a constant
// here and listing it in `OPERATIONS`.

use super::operation::{OperationDescriptor, OperationKind, SessionVariable, Slot, SlotType};

pub const FETCH_ALL_INSTALLATIONS: OperationDescriptor = OperationDescriptor {
    key: "fetch_all_installations",
    name: "fetchAllInstallations",
    kind: OperationKind::Query,
    help: "Fetch all installations on the account",
    document: "query fetchAllInstallations($email: String!) {\n  account(email: $email) {\n    installations {\n      giid\n      alias\n      customerType\n      dealerId\n      subsidiary\n      pinCodeLength\n      locale\n      address {\n        street\n        city\n        postalNumber\n        __typename\n      }\n      __typename\n    }\n    __typename\n  }\n}\n",
    slots: &[Slot::session("email", SessionVariable::Username)],
};

pub const GUARDIAN_SOS: OperationDescriptor = OperationDescriptor {
    key: "guardian_sos",
    name: "GuardianSos",
    kind: OperationKind::Query,
    help: "Read Guardian SOS contacts",
    document: "query GuardianSos {\n  guardianSos {\n    serverTime\n    sos {\n      fullName\n      phone\n      deviceId\n      deviceName\n      giid\n      type\n      username\n      expireDate\n      warnBeforeExpireDate\n      contactId\n      __typename\n    }\n    __typename\n  }\n}\n",
    slots: &[],
};

pub const IS_GUARDIAN_ACTIVATED: OperationDescriptor = OperationDescriptor {
    key: "is_guardian_activated",
    name: "IsGuardianActivated",
    kind: OperationKind::Query,
    help: "Check whether Guardian is activated",
    document: "query IsGuardianActivated($giid: String!, $featureName: String!) {\n  installation(giid: $giid) {\n    activatedFeature {\n      isFeatureActivated(featureName: $featureName)\n      __typename\n    }\n    __typename\n  }\n}\n",
    slots: &[
        Slot::session("giid", SessionVariable::Giid),
        Slot::constant("featureName", "GUARDIAN"),
    ],
};

pub const SMART_PLUGS: OperationDescriptor = OperationDescriptor {
    key: "smart_plugs",
    name: "SmartPlug",
    kind: OperationKind::Query,
    help: "Read status of all smart plugs",
    document: "query SmartPlug($giid: String!) {\n  installation(giid: $giid) {\n    smartplugs {\n      device {\n        deviceLabel\n        area\n        __typename\n      }\n      currentState\n      icon\n      isHazardous\n      __typename\n    }\n    __typename\n  }\n}\n",
    slots: &[Slot::session("giid", SessionVariable::Giid)],
};

pub const SMART_PLUG: OperationDescriptor = OperationDescriptor {
    key: "smart_plug",
    name: "SmartPlug",
    kind: OperationKind::Query,
    help: "Read status of a single smart plug",
    document: "query SmartPlug($giid: String!, $deviceLabel: String!) {\n  installation(giid: $giid) {\n    smartplugs(filter: {deviceLabels: [$deviceLabel]}) {\n      device {\n        deviceLabel\n        area\n        __typename\n      }\n      currentState\n      icon\n      isHazardous\n      __typename\n    }\n    __typename\n  }\n}\n",
    slots: &[
        Slot::session("giid", SessionVariable::Giid),
        Slot::caller("deviceLabel", SlotType::DeviceLabel),
    ],
};

pub const DOOR_WINDOW: OperationDescriptor = OperationDescriptor {
    key: "door_window",
    name: "DoorWindow",
    kind: OperationKind::Query,
    help: "Read status of door and window sensors",
    document: "query DoorWindow($giid: String!) {\n  installation(giid: $giid) {\n    doorWindows {\n      device {\n        deviceLabel\n        __typename\n      }\n      type\n      area\n      state\n      wired\n      reportTime\n      __typename\n    }\n    __typename\n  }\n}\n",
    slots: &[Slot::session("giid", SessionVariable::Giid)],
};

pub const REMAINING_SMS: OperationDescriptor = OperationDescriptor {
    key: "remaining_sms",
    name: "RemainingSms",
    kind: OperationKind::Query,
    help: "Get remaining number of SMS",
    document: "query RemainingSms($giid: String!) {\n  installation(giid: $giid) {\n    remainingSms\n    __typename\n  }\n}\n",
    slots: &[Slot::session("giid", SessionVariable::Giid)],
};

pub const CHARGE_SMS: OperationDescriptor = OperationDescriptor {
    key: "charge_sms",
    name: "ChargeSms",
    kind: OperationKind::Query,
    help: "Read SMS charging settings",
    document: "query ChargeSms($giid: String!) {\n  installation(giid: $giid) {\n    chargeSms {\n      chargeSmartPlugOnOff\n      __typename\n    }\n    __typename\n  }\n}\n",
    slots: &[Slot::session("giid", SessionVariable::Giid)],
};

pub const CLIMATE: OperationDescriptor = OperationDescriptor {
    key: "climate",
    name: "Climate",
    kind: OperationKind::Query,
    help: "Read climate sensors",
    document: "query Climate($giid: String!) {\n  installation(giid: $giid) {\n    climates {\n      device {\n        deviceLabel\n        area\n        gui {\n          label\n          __typename\n        }\n        __typename\n      }\n      humidityEnabled\n      humidityTimestamp\n      humidityValue\n      temperatureTimestamp\n      temperatureValue\n      thresholds {\n        aboveMaxAlert\n        belowMinAlert\n        sensorType\n        __typename\n      }\n      __typename\n    }\n    __typename\n  }\n}\n",
    slots: &[Slot::session("giid", SessionVariable::Giid)],
};

pub const SMART_BUTTON: OperationDescriptor = OperationDescriptor {
    key: "smart_button",
    name: "SmartButton",
    kind: OperationKind::Query,
    help: "Read smart button configuration",
    document: "query SmartButton($giid: String!) {\n  installation(giid: $giid) {\n    smartButton {\n      entries {\n        smartButtonId\n        icon\n        label\n        color\n        active\n        action {\n          actionType\n          expectedState\n          target {\n            ... on Installation {\n              alias\n              __typename\n            }\n            ... on Device {\n              deviceLabel\n              area\n              gui {\n                label\n                __typename\n              }\n              featureStatuses(type: \"SmartPlug\") {\n                device {\n                  deviceLabel\n                  __typename\n                }\n                ... on SmartPlug {\n                  icon\n                  isHazardous\n                  __typename\n                }\n                __typename\n              }\n              __typename\n            }\n            __typename\n          }\n          __typename\n        }\n        __typename\n      }\n      __typename\n    }\n    __typename\n  }\n}\n",
    slots: &[Slot::session("giid", SessionVariable::Giid)],
};

pub const BROADBAND: OperationDescriptor = OperationDescriptor {
    key: "broadband",
    name: "Broadband",
    kind: OperationKind::Query,
    help: "Read broadband connection status",
    document: "query Broadband($giid: String!) {\n  installation(giid: $giid) {\n    broadband {\n      testDate\n      isBroadbandConnected\n      __typename\n    }\n    __typename\n  }\n}\n",
    slots: &[Slot::session("giid", SessionVariable::Giid)],
};

pub const CAPABILITY: OperationDescriptor = OperationDescriptor {
    key: "capability",
    name: "Capability",
    kind: OperationKind::Query,
    help: "Read installation capabilities",
    document: "query Capability($giid: String!) {\n  installation(giid: $giid) {\n    capability {\n      current\n      gained {\n        capability\n        __typename\n      }\n      __typename\n    }\n    __typename\n  }\n}\n",
    slots: &[Slot::session("giid", SessionVariable::Giid)],
};

pub const USER_TRACKINGS: OperationDescriptor = OperationDescriptor {
    key: "user_trackings",
    name: "userTrackings",
    kind: OperationKind::Query,
    help: "Read user tracking status",
    document: "query userTrackings($giid: String!) {\n  installation(giid: $giid) {\n    userTrackings {\n      isCallingUser\n      webAccount\n      status\n      xbnContactId\n      currentLocationName\n      deviceId\n      name\n      initials\n      currentLocationTimestamp\n      deviceName\n      currentLocationId\n      __typename\n    }\n    __typename\n  }\n}\n",
    slots: &[Slot::session("giid", SessionVariable::Giid)],
};

pub const USER_TRACKING_INSTALLATION_CONFIG: OperationDescriptor = OperationDescriptor {
    key: "user_tracking_installation_config",
    name: "userTrackingInstallationConfig",
    kind: OperationKind::Query,
    help: "Read user tracking configuration",
    document: "query userTrackingInstallationConfig($giid: String!) {\n  installation(giid: $giid) {\n    userTrackings {\n      isCallingUser\n      webAccount\n      status\n      xbnContactId\n      currentLocationName\n      deviceId\n      name\n      initials\n      currentLocationTimestamp\n      deviceName\n      currentLocationId\n      __typename\n    }\n    __typename\n  }\n}\n",
    slots: &[Slot::session("giid", SessionVariable::Giid)],
};

/// Every supported operation, in listing order.
pub const OPERATIONS: &[OperationDescriptor] = &[
    FETCH_ALL_INSTALLATIONS,
    GUARDIAN_SOS,
    IS_GUARDIAN_ACTIVATED,
    SMART_PLUGS,
    SMART_PLUG,
    DOOR_WINDOW,
    REMAINING_SMS,
    CHARGE_SMS,
    CLIMATE,
    SMART_BUTTON,
    BROADBAND,
    CAPABILITY,
    USER_TRACKINGS,
    USER_TRACKING_INSTALLATION_CONFIG,
];

/// Look up an operation by catalog key.
pub fn find(key: &str) -> Option<&'static OperationDescriptor> {
    OPERATIONS.iter().find(|op| op.key == key)
}
