// Compiled wire types for the gRPC backends this service talks to.
//
// The `.proto` files live in this crate; method paths are listed next to the
// generated messages for the path-based transports in dex-server.

pub mod odpf {
    pub mod entropy {
        pub mod v1beta1 {
            tonic::include_proto!("odpf.entropy.v1beta1");

            /// Fully-qualified method paths of `ResourceService`.
            pub mod resource_service {
                pub const LIST_RESOURCES: &str =
                    "/odpf.entropy.v1beta1.ResourceService/ListResources";
                pub const GET_RESOURCE: &str = "/odpf.entropy.v1beta1.ResourceService/GetResource";
                pub const CREATE_RESOURCE: &str =
                    "/odpf.entropy.v1beta1.ResourceService/CreateResource";
                pub const UPDATE_RESOURCE: &str =
                    "/odpf.entropy.v1beta1.ResourceService/UpdateResource";
                pub const DELETE_RESOURCE: &str =
                    "/odpf.entropy.v1beta1.ResourceService/DeleteResource";
                pub const APPLY_ACTION: &str = "/odpf.entropy.v1beta1.ResourceService/ApplyAction";
                pub const GET_LOG: &str = "/odpf.entropy.v1beta1.ResourceService/GetLog";
            }
        }
    }

    pub mod shield {
        pub mod v1beta1 {
            tonic::include_proto!("odpf.shield.v1beta1");

            /// Fully-qualified method paths of `ShieldService`.
            pub mod shield_service {
                pub const GET_PROJECT: &str = "/odpf.shield.v1beta1.ShieldService/GetProject";
            }
        }
    }
}

pub use odpf::entropy::v1beta1 as entropy_v1beta1;
pub use odpf::shield::v1beta1 as shield_v1beta1;
