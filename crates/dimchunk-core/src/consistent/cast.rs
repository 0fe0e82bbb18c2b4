use crate::{CastError, DType, NdSbp, Placement, Session, Shape};

/// A tensor as seen by one rank.
#[derive(derive_new::new, Debug, Clone, PartialEq, Eq)]
pub struct MirroredTensor {
    pub shape: Shape,
    pub dt: DType,
}

/// A tensor as seen by the whole placement.
#[derive(derive_new::new, Debug, Clone, PartialEq, Eq)]
pub struct ConsistentTensor {
    pub logical_shape: Shape,
    pub dt: DType,
    pub nd_sbp: NdSbp,
    pub placement: Placement,
}

impl ConsistentTensor {
    pub fn local_shape(&self, rank: usize) -> Result<Shape, CastError> {
        self.placement
            .local_shape(&self.logical_shape, &self.nd_sbp, rank)
    }
}

/// SBP signature and placement for one argument or result.
#[derive(derive_new::new, Debug, Clone, PartialEq)]
pub struct Distribution {
    pub nd_sbp: NdSbp,
    pub placement: Placement,
}

impl Distribution {
    fn validate(&self) -> Result<(), CastError> {
        let hierarchy = self.placement.hierarchy();
        if self.nd_sbp.len() != hierarchy.rank() {
            return Err(CastError::HierarchyMismatch {
                sbps: self.nd_sbp.len(),
                hierarchy: hierarchy.clone(),
            });
        }
        Ok(())
    }
}

/// Distributions for every input and output of a cast function.
#[derive(Debug, Clone, PartialEq)]
pub struct CastSignature {
    inputs: Vec<Distribution>,
    outputs: Vec<Distribution>,
}

impl CastSignature {
    /// Pairs SBPs with placements.
    ///
    /// Without explicit placements every argument and result uses the
    /// placement of the session's current scope.
    pub fn new(
        session: &Session,
        input_sbps: Vec<NdSbp>,
        output_sbps: Vec<NdSbp>,
        placements: Option<(Vec<Placement>, Vec<Placement>)>,
    ) -> Result<Self, CastError> {
        let (input_placements, output_placements) = placements.unwrap_or_else(|| {
            let default = session.current_scope().placement();
            (
                vec![default.clone(); input_sbps.len()],
                vec![default.clone(); output_sbps.len()],
            )
        });
        let inputs = Self::pair(input_sbps, input_placements)?;
        let outputs = Self::pair(output_sbps, output_placements)?;
        Ok(Self { inputs, outputs })
    }

    fn pair(sbps: Vec<NdSbp>, placements: Vec<Placement>) -> Result<Vec<Distribution>, CastError> {
        if sbps.len() != placements.len() {
            return Err(CastError::PlacementArity {
                sbps: sbps.len(),
                placements: placements.len(),
            });
        }
        sbps.into_iter()
            .zip(placements)
            .map(|(nd_sbp, placement)| {
                let dist = Distribution::new(nd_sbp, placement);
                dist.validate()?;
                Ok(dist)
            })
            .collect()
    }

    pub fn inputs(&self) -> &[Distribution] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Distribution] {
        &self.outputs
    }
}

/// Interprets each rank-local input as a uniform shard of a consistent tensor.
pub fn cast_input_to_consistent(
    session: &Session,
    args: Vec<MirroredTensor>,
    dists: &[Distribution],
) -> Result<Vec<ConsistentTensor>, CastError> {
    if !session.is_consistent() {
        return Err(CastError::NotInConsistentScope);
    }
    if args.len() != dists.len() {
        return Err(CastError::ArityMismatch {
            expected: dists.len(),
            actual: args.len(),
        });
    }
    args.into_iter()
        .zip(dists)
        .map(|(arg, dist)| {
            let logical_shape = dist.placement.logical_shape(&arg.shape, &dist.nd_sbp)?;
            log::debug!(
                "input {:?} -> logical {:?} under {}",
                arg.shape,
                logical_shape,
                dist.nd_sbp
            );
            Ok(ConsistentTensor::new(
                logical_shape,
                arg.dt,
                dist.nd_sbp.clone(),
                dist.placement.clone(),
            ))
        })
        .collect()
}

/// Redistributes each consistent output per `dists` and keeps the shard owned by `rank`.
pub fn cast_output_from_consistent(
    outputs: Vec<ConsistentTensor>,
    dists: &[Distribution],
    rank: usize,
) -> Result<Vec<MirroredTensor>, CastError> {
    if outputs.len() != dists.len() {
        return Err(CastError::ArityMismatch {
            expected: dists.len(),
            actual: outputs.len(),
        });
    }
    outputs
        .into_iter()
        .zip(dists)
        .map(|(out, dist)| {
            let shape = dist
                .placement
                .local_shape(&out.logical_shape, &dist.nd_sbp, rank)?;
            Ok(MirroredTensor::new(shape, out.dt))
        })
        .collect()
}

/// A function over consistent tensors.
pub trait ConsistentFn {
    fn call(
        &self,
        session: &Session,
        args: Vec<ConsistentTensor>,
    ) -> Result<Vec<ConsistentTensor>, CastError>;
}

impl<F> ConsistentFn for F
where
    F: Fn(&Session, Vec<ConsistentTensor>) -> Result<Vec<ConsistentTensor>, CastError>,
{
    fn call(
        &self,
        session: &Session,
        args: Vec<ConsistentTensor>,
    ) -> Result<Vec<ConsistentTensor>, CastError> {
        self(session, args)
    }
}

/// A function over rank-local tensors.
pub trait MirroredFn {
    fn call(
        &self,
        session: &mut Session,
        args: Vec<MirroredTensor>,
    ) -> Result<Vec<MirroredTensor>, CastError>;
}

impl<F> MirroredFn for F
where
    F: Fn(&mut Session, Vec<MirroredTensor>) -> Result<Vec<MirroredTensor>, CastError>,
{
    fn call(
        &self,
        session: &mut Session,
        args: Vec<MirroredTensor>,
    ) -> Result<Vec<MirroredTensor>, CastError> {
        self(session, args)
    }
}

/// Entities that know how to convert themselves to consistent execution.
pub trait ToConsistent {
    fn to_consistent(
        self: Box<Self>,
        signature: &CastSignature,
    ) -> Result<Box<dyn MirroredFn>, CastError>;
}

/// What can be handed to [`ConsistentCast::register`].
pub enum CastEntity {
    /// Plain function; wrapped so its arguments and results are cast.
    Callable(Box<dyn ConsistentFn>),
    /// Entity with its own conversion.
    Native(Box<dyn ToConsistent>),
}

impl CastEntity {
    pub fn callable<F: ConsistentFn + 'static>(f: F) -> Self {
        CastEntity::Callable(Box::new(f))
    }

    pub fn native<E: ToConsistent + 'static>(entity: E) -> Self {
        CastEntity::Native(Box::new(entity))
    }
}

/// A plain function wrapped with input and output casts.
pub struct CastAdapter {
    signature: CastSignature,
    func: Box<dyn ConsistentFn>,
}

impl CastAdapter {
    pub fn signature(&self) -> &CastSignature {
        &self.signature
    }

    pub fn call(
        &self,
        session: &mut Session,
        args: Vec<MirroredTensor>,
    ) -> Result<Vec<MirroredTensor>, CastError> {
        let rank = session.rank();
        session.with_consistent_scope(|sess| {
            let inputs = cast_input_to_consistent(sess, args, &self.signature.inputs)?;
            let outputs = self.func.call(sess, inputs)?;
            cast_output_from_consistent(outputs, &self.signature.outputs, rank)
        })
    }
}

/// Result of registering a [`CastEntity`].
pub enum Registered {
    Adapter(CastAdapter),
    Native(Box<dyn MirroredFn>),
}

impl Registered {
    pub fn call(
        &self,
        session: &mut Session,
        args: Vec<MirroredTensor>,
    ) -> Result<Vec<MirroredTensor>, CastError> {
        match self {
            Registered::Adapter(adapter) => adapter.call(session, args),
            Registered::Native(func) => func.call(session, args),
        }
    }
}

impl std::fmt::Debug for Registered {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Registered::Adapter(adapter) => f
                .debug_tuple("Adapter")
                .field(adapter.signature())
                .finish(),
            Registered::Native(_) => f.write_str("Native"),
        }
    }
}

/// # ConsistentCast
///
/// Runs mirrored code under a consistent signature. The kind of entity is
/// decided once, at registration.
#[derive(derive_new::new, Debug, Clone)]
pub struct ConsistentCast {
    signature: CastSignature,
}

impl ConsistentCast {
    pub fn signature(&self) -> &CastSignature {
        &self.signature
    }

    pub fn register(&self, entity: CastEntity) -> Result<Registered, CastError> {
        match entity {
            CastEntity::Callable(func) => Ok(Registered::Adapter(CastAdapter {
                signature: self.signature.clone(),
                func,
            })),
            CastEntity::Native(entity) => {
                Ok(Registered::Native(entity.to_consistent(&self.signature)?))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{shape, DeviceKind};
    use std::cell::Cell;
    use std::rc::Rc;

    fn session(rank: usize) -> Session {
        Session::new(rank, Placement::flat(DeviceKind::Cpu, vec![0, 1, 2]).unwrap())
    }

    fn nd(s: &str) -> NdSbp {
        s.parse().unwrap()
    }

    fn identity(
        _: &Session,
        args: Vec<ConsistentTensor>,
    ) -> Result<Vec<ConsistentTensor>, CastError> {
        Ok(args)
    }

    #[test]
    fn test_signature_defaults_to_scope_placement() {
        let sess = session(0);
        let sig = CastSignature::new(&sess, vec![nd("S(0)")], vec![nd("B"), nd("P")], None).unwrap();
        assert_eq!(sig.inputs().len(), 1);
        assert_eq!(sig.outputs().len(), 2);
        assert!(sig
            .outputs()
            .iter()
            .all(|d| &d.placement == sess.current_scope().placement()));
    }

    #[test]
    fn test_signature_rejects_bad_hierarchy() {
        let sess = session(0);
        let err = CastSignature::new(&sess, vec![nd("S(0),B")], vec![], None).unwrap_err();
        assert!(matches!(err, CastError::HierarchyMismatch { sbps: 2, .. }));

        let p = Placement::flat(DeviceKind::Cpu, vec![0]).unwrap();
        let err = CastSignature::new(&sess, vec![nd("B")], vec![], Some((vec![], vec![p])))
            .unwrap_err();
        assert!(matches!(
            err,
            CastError::PlacementArity {
                sbps: 1,
                placements: 0
            }
        ));
    }

    #[test]
    fn test_adapter_split_to_broadcast() {
        let mut sess = session(2);
        let sig = CastSignature::new(&sess, vec![nd("S(0)")], vec![nd("B")], None).unwrap();
        let seen = Rc::new(Cell::new(false));
        let seen_in = seen.clone();
        let registered = ConsistentCast::new(sig)
            .register(CastEntity::callable(
                move |s: &Session,
                      args: Vec<ConsistentTensor>|
                      -> Result<Vec<ConsistentTensor>, CastError> {
                    assert!(s.is_consistent());
                    assert_eq!(args[0].logical_shape, shape![6, 4]);
                    seen_in.set(true);
                    Ok(args)
                },
            ))
            .unwrap();
        assert!(matches!(registered, Registered::Adapter(_)));

        let out = registered
            .call(&mut sess, vec![MirroredTensor::new(shape![2, 4], DType::F32)])
            .unwrap();
        assert!(seen.get());
        assert_eq!(out, vec![MirroredTensor::new(shape![6, 4], DType::F32)]);
        assert!(!sess.is_consistent());
    }

    #[test]
    fn test_adapter_reshards_output() {
        let mut sess = session(2);
        let sig = CastSignature::new(&sess, vec![nd("B")], vec![nd("S(1)")], None).unwrap();
        let registered = ConsistentCast::new(sig)
            .register(CastEntity::callable(identity))
            .unwrap();
        let out = registered
            .call(&mut sess, vec![MirroredTensor::new(shape![3, 7], DType::F16)])
            .unwrap();
        assert_eq!(out[0].shape, shape![3, 1]);
    }

    #[test]
    fn test_adapter_arity() {
        let mut sess = session(0);
        let sig = CastSignature::new(&sess, vec![nd("B")], vec![nd("B")], None).unwrap();
        let registered = ConsistentCast::new(sig)
            .register(CastEntity::callable(identity))
            .unwrap();
        let err = registered.call(&mut sess, vec![]).unwrap_err();
        assert!(matches!(
            err,
            CastError::ArityMismatch {
                expected: 1,
                actual: 0
            }
        ));
    }

    #[test]
    fn test_cast_requires_consistent_scope() {
        let sess = session(0);
        let err = cast_input_to_consistent(&sess, vec![], &[]).unwrap_err();
        assert!(matches!(err, CastError::NotInConsistentScope));
    }

    struct Doubler;

    impl ToConsistent for Doubler {
        fn to_consistent(
            self: Box<Self>,
            signature: &CastSignature,
        ) -> Result<Box<dyn MirroredFn>, CastError> {
            let outputs = signature.outputs().len();
            Ok(Box::new(
                move |_: &mut Session,
                      args: Vec<MirroredTensor>|
                      -> Result<Vec<MirroredTensor>, CastError> {
                    Ok(args.into_iter().cycle().take(outputs).collect())
                },
            ))
        }
    }

    #[test]
    fn test_native_entity_converts_itself() {
        let mut sess = session(1);
        let sig = CastSignature::new(&sess, vec![nd("B")], vec![nd("B"), nd("B")], None).unwrap();
        let registered = ConsistentCast::new(sig)
            .register(CastEntity::native(Doubler))
            .unwrap();
        assert!(matches!(registered, Registered::Native(_)));
        let input = MirroredTensor::new(shape![2], DType::I32);
        let out = registered.call(&mut sess, vec![input.clone()]).unwrap();
        assert_eq!(out, vec![input.clone(), input]);
    }
}
