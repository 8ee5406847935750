use kube::core::CustomResourceExt;
use mesh_gc::crd::ServiceMeshControlPlane;

fn main() {
    let crd = ServiceMeshControlPlane::crd();
    let yaml = serde_yaml::to_string(&crd).expect("serialize CRD to YAML");
    println!("{}", yaml);
}
